//! 複数画像の一括検査
//!
//! `scan` コマンド本体。1枚ずつフローを回し、結果と失敗件数をまとめる。

use crate::capture;
use crate::error::{InspectError, Result};
use crate::session::scan_with_progress;
use ic_inspect_common::{AppStore, InspectionFlow, ResultSource, ResultView, ScanResult, ScanTimings};
use std::path::PathBuf;
use std::sync::Arc;

/// 一括検査の結果
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<ScanResult>,
    pub failed: usize,
    pub total: usize,
}

impl BatchOutcome {
    /// JSON出力
    ///
    /// フォルダ指定は件数に関わらず配列、ファイル指定は結果1件のオブジェクト。
    /// ファイル指定で結果がなければ None。
    pub fn to_json(&self, folder: bool) -> Result<Option<String>> {
        let output = match self.results.as_slice() {
            _ if folder => serde_json::to_string_pretty(&self.results)?,
            [single] => serde_json::to_string_pretty(single)?,
            [] => return Ok(None),
            results => serde_json::to_string_pretty(results)?,
        };
        Ok(Some(output))
    }

    /// 1件でも失敗していればエラー
    pub fn ensure_all_passed(&self) -> Result<()> {
        if self.failed > 0 {
            return Err(InspectError::ScanFailed { failed: self.failed, total: self.total });
        }
        Ok(())
    }
}

/// 対象画像を順に検査する
///
/// `quiet` では進捗と結果を表示しない（JSON出力用）。
/// 最初の1枚が通信エラーになった場合は残りも同じなので中断してエラーを返す。
pub async fn scan_targets(
    targets: &[PathBuf],
    store: &mut AppStore,
    source: Arc<dyn ResultSource>,
    timings: ScanTimings,
    quiet: bool,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome { total: targets.len(), ..Default::default() };

    for (i, target) in targets.iter().enumerate() {
        let captured = match capture::load_image(target) {
            Ok(captured) => captured,
            Err(e) => {
                eprintln!("⚠ スキップ: {}", e);
                outcome.failed += 1;
                continue;
            }
        };

        let mut flow = InspectionFlow::new();
        flow.select_image(store, captured.image);
        if !quiet {
            println!("[{}/{}] {}", i + 1, targets.len(), target.display());
        }

        match scan_with_progress(&mut flow, store, source.clone(), timings).await {
            Ok(Some(result)) => {
                if !quiet {
                    println!("{}\n", ResultView::from(&result));
                }
                outcome.results.push(result);
            }
            Ok(None) => outcome.failed += 1,
            Err(InspectError::Backend(e)) if outcome.results.is_empty() && e.is_transport() => {
                return Err(e.into());
            }
            Err(e) => {
                eprintln!("✘ {}: {}", target.display(), e);
                outcome.failed += 1;
            }
        }
    }

    tracing::info!(total = outcome.total, failed = outcome.failed, "batch finished");
    Ok(outcome)
}
