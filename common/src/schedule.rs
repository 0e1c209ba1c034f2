//! スキャンの時間制御
//!
//! フラッシュ・解析の2段階をtokioタスクで進め、イベントをチャネルで返す。
//! 状態の変更は受け取った側（ストアの所有者）が [`ScheduledScan::apply`] で行う。
//! タスクは `cancel()` またはドロップで中止される。

use crate::error::{Error, Result};
use crate::flow::{InspectionFlow, ScanTimings};
use crate::source::ResultSource;
use crate::store::{AppStore, ImageRef};
use crate::types::ScanResult;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum PhaseEvent {
    FlashElapsed,
    Completed(ScanResult),
    Failed(Error),
}

/// イベントを反映した結果
#[derive(Debug)]
pub enum Applied {
    Pending,
    Done,
    Failed(Error),
}

pub struct ScheduledScan {
    rx: mpsc::UnboundedReceiver<PhaseEvent>,
    handle: JoinHandle<()>,
}

impl ScheduledScan {
    /// フラッシュ → 解析 のタスクを起動
    ///
    /// 解析は取得元の応答と解析時間の経過の両方を待つ。
    pub fn spawn(
        runtime: &Handle,
        timings: ScanTimings,
        source: Arc<dyn ResultSource>,
        image: ImageRef,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = runtime.spawn(async move {
            tokio::time::sleep(timings.flash).await;
            if tx.send(PhaseEvent::FlashElapsed).is_err() {
                return;
            }

            let (outcome, _) = tokio::join!(
                source.analyze(&image),
                tokio::time::sleep(timings.processing)
            );
            let event = match outcome {
                Ok(result) => PhaseEvent::Completed(result),
                Err(err) => PhaseEvent::Failed(err),
            };
            let _ = tx.send(event);
        });

        Self { rx, handle }
    }

    /// 次のイベントを待つ（タスク終了後は None）
    pub async fn next(&mut self) -> Option<PhaseEvent> {
        self.rx.recv().await
    }

    /// ブロックせずに取り出す（UIのフレームごとのポーリング用）
    ///
    /// 終了イベントを送らずにタスクが終わった場合（パニック・中止）は
    /// `Failed(Cancelled)` を返し、`apply` でフローを Ready へ戻せるようにする。
    pub fn try_next(&mut self) -> Option<PhaseEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(PhaseEvent::Failed(Error::Cancelled)),
        }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// イベントをフローとストアへ反映
    pub fn apply(event: PhaseEvent, flow: &mut InspectionFlow, store: &mut AppStore) -> Applied {
        match event {
            PhaseEvent::FlashElapsed => {
                flow.finish_flash(store);
                Applied::Pending
            }
            PhaseEvent::Completed(result) => {
                if flow.complete(store, result) {
                    Applied::Done
                } else {
                    Applied::Failed(Error::Cancelled)
                }
            }
            PhaseEvent::Failed(err) => {
                flow.abort_scan(store);
                Applied::Failed(err)
            }
        }
    }

    /// 開始済みのフローを完了まで進める
    pub async fn run_to_completion(
        mut self,
        flow: &mut InspectionFlow,
        store: &mut AppStore,
    ) -> Result<()> {
        while let Some(event) = self.next().await {
            match Self::apply(event, flow, store) {
                Applied::Pending => continue,
                Applied::Done => return Ok(()),
                Applied::Failed(err) => return Err(err),
            }
        }
        flow.abort_scan(store);
        Err(Error::Cancelled)
    }
}

impl Drop for ScheduledScan {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 画像選択済みのフローでスキャンを1回実行する
///
/// 既にスキャン中、または画像未選択なら `Ok(false)`。
pub async fn run_scan(
    flow: &mut InspectionFlow,
    store: &mut AppStore,
    source: Arc<dyn ResultSource>,
    timings: ScanTimings,
) -> Result<bool> {
    if !flow.start_scan(store) {
        return Ok(false);
    }
    let Some(image) = flow.selected_image().cloned() else {
        return Ok(false);
    };

    let scan = ScheduledScan::spawn(&Handle::current(), timings, source, image);
    scan.run_to_completion(flow, store).await?;
    Ok(true)
}
