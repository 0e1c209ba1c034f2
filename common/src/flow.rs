//! 1回のスキャンのライフサイクル
//!
//! `Idle → Ready → Scanning(Flash → Processing) → Result` の状態機械。
//! 遷移はすべてここで行い、AppStore への書き込みも遷移に合わせて行う。
//! 受け付けない操作は `false` を返すだけでエラーにはしない。

use crate::store::{AppStore, ImageRef};
use crate::types::ScanResult;
use crate::viewport::Viewport;
use std::time::Duration;

/// 撮影フラッシュの長さ
pub const FLASH_DURATION: Duration = Duration::from_millis(120);
/// 解析処理の長さ
pub const PROCESSING_DURATION: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTimings {
    pub flash: Duration,
    pub processing: Duration,
}

impl Default for ScanTimings {
    fn default() -> Self {
        Self {
            flash: FLASH_DURATION,
            processing: PROCESSING_DURATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Flash,
    Processing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    Ready { image: ImageRef },
    Scanning { image: ImageRef, phase: ScanPhase },
    Result { image: ImageRef, result: Box<ScanResult> },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Ready { .. } => "ready",
            FlowState::Scanning { phase: ScanPhase::Flash, .. } => "flash",
            FlowState::Scanning { phase: ScanPhase::Processing, .. } => "processing",
            FlowState::Result { .. } => "result",
        }
    }
}

/// キー操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
}

/// キー操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// 画像選択ダイアログを開くよう呼び出し側に求める
    SelectImage,
    ScanStarted,
    NextScan,
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct InspectionFlow {
    state: FlowState,
    viewport: Viewport,
}

impl Default for FlowState {
    fn default() -> Self {
        FlowState::Idle
    }
}

impl InspectionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state, FlowState::Scanning { .. })
    }

    pub fn selected_image(&self) -> Option<&ImageRef> {
        match &self.state {
            FlowState::Idle => None,
            FlowState::Ready { image }
            | FlowState::Scanning { image, .. }
            | FlowState::Result { image, .. } => Some(image),
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        match &self.state {
            FlowState::Result { result, .. } => Some(&**result),
            _ => None,
        }
    }

    fn transition(&mut self, next: FlowState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "flow transition");
        self.state = next;
    }

    /// 画像を選択（読み込み完了時）
    pub fn select_image(&mut self, store: &mut AppStore, image: ImageRef) -> bool {
        if self.is_scanning() {
            return false;
        }
        self.viewport.reset();
        store.reset_scan();
        self.transition(FlowState::Ready { image });
        true
    }

    /// 選択中の画像を外す
    pub fn clear_image(&mut self, store: &mut AppStore) -> bool {
        if self.is_scanning() {
            return false;
        }
        self.viewport.reset();
        store.reset_scan();
        self.transition(FlowState::Idle);
        true
    }

    /// スキャン開始
    ///
    /// 画像未選択・スキャン中（ストア側のフラグ含む）は何もしない。
    pub fn start_scan(&mut self, store: &mut AppStore) -> bool {
        if store.snapshot().is_scanning {
            return false;
        }
        let FlowState::Ready { image } = &self.state else {
            return false;
        };
        let image = image.clone();

        store.set_scanning(true);
        tracing::info!(image = image.name(), "scan started");
        self.transition(FlowState::Scanning { image, phase: ScanPhase::Flash });
        true
    }

    /// フラッシュ終了 → 解析中
    pub fn finish_flash(&mut self, store: &mut AppStore) -> bool {
        let FlowState::Scanning { image, phase: ScanPhase::Flash } = &self.state else {
            return false;
        };
        let image = image.clone();

        store.set_captured_image(Some(image.clone()));
        self.transition(FlowState::Scanning { image, phase: ScanPhase::Processing });
        true
    }

    /// 解析完了 → 結果表示
    ///
    /// 結果をストアへ書き込み、履歴と統計を1回だけ更新する。
    pub fn complete(&mut self, store: &mut AppStore, mut result: ScanResult) -> bool {
        let FlowState::Scanning { image, phase: ScanPhase::Processing } = &self.state else {
            return false;
        };
        let image = image.clone();

        if result.timestamp.is_none() {
            result.timestamp = Some(chrono::Utc::now().to_rfc3339());
        }

        let registered = result.preprocessed_image_url().map(|u| ImageRef::Url(u.to_string()));
        store.finish_scan(result.clone(), registered);

        tracing::info!(status = %result.status(), "scan completed");
        self.transition(FlowState::Result { image, result: Box::new(result) });
        true
    }

    /// スキャンを中断して Ready に戻す（統計は変更しない）
    pub fn abort_scan(&mut self, store: &mut AppStore) -> bool {
        let FlowState::Scanning { image, .. } = &self.state else {
            return false;
        };
        let image = image.clone();

        store.reset_scan();
        tracing::warn!(image = image.name(), "scan aborted");
        self.transition(FlowState::Ready { image });
        true
    }

    /// 次のスキャンへ（画像は残す）
    pub fn next_scan(&mut self, store: &mut AppStore) -> bool {
        let FlowState::Result { image, .. } = &self.state else {
            return false;
        };
        let image = image.clone();

        store.reset_scan();
        self.transition(FlowState::Ready { image });
        true
    }

    /// キーボード操作（Space: 選択/開始、Enter: 次へ）
    ///
    /// スキャン中はすべて無視する。
    pub fn handle_key(&mut self, store: &mut AppStore, key: Key) -> KeyOutcome {
        if self.is_scanning() {
            return KeyOutcome::Ignored;
        }
        match key {
            Key::Space if self.selected_image().is_none() => KeyOutcome::SelectImage,
            Key::Space => {
                if self.start_scan(store) {
                    KeyOutcome::ScanStarted
                } else {
                    KeyOutcome::Ignored
                }
            }
            Key::Enter => {
                if self.next_scan(store) {
                    KeyOutcome::NextScan
                } else {
                    KeyOutcome::Ignored
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BranchA, OverallStatus};

    fn image() -> ImageRef {
        ImageRef::bytes("chip.png", vec![0x89u8, 0x50, 0x4e, 0x47])
    }

    fn genuine() -> ScanResult {
        ScanResult {
            overall_status: Some(OverallStatus::Genuine),
            branch_a: Some(BranchA {
                preprocessed_image_url: Some("/demo-registered.jpg".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn run_to_result(flow: &mut InspectionFlow, store: &mut AppStore) {
        assert!(flow.start_scan(store));
        assert!(flow.finish_flash(store));
        assert!(flow.complete(store, genuine()));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        assert_eq!(flow.state(), &FlowState::Idle);

        assert!(flow.select_image(&mut store, image()));
        assert_eq!(flow.state().name(), "ready");

        assert!(flow.start_scan(&mut store));
        assert_eq!(flow.state().name(), "flash");
        assert!(store.snapshot().is_scanning);
        assert!(store.snapshot().captured_image.is_none());

        assert!(flow.finish_flash(&mut store));
        assert_eq!(flow.state().name(), "processing");
        assert_eq!(store.snapshot().captured_image, Some(image()));

        assert!(flow.complete(&mut store, genuine()));
        let state = store.snapshot();
        assert_eq!(flow.state().name(), "result");
        assert!(!state.is_scanning);
        assert_eq!(state.scan_result.as_ref().map(|r| r.status()), Some(OverallStatus::Genuine));
        assert_eq!(state.registered_image, Some(ImageRef::Url("/demo-registered.jpg".into())));
        assert_eq!(state.shift_stats.pass_count, 1);
        assert!(state.scan_history.latest().unwrap().timestamp.is_some());

        assert!(flow.next_scan(&mut store));
        assert_eq!(flow.state(), &FlowState::Ready { image: image() });
        let state = store.snapshot();
        assert!(state.scan_result.is_none());
        assert!(state.captured_image.is_none());
        assert_eq!(state.shift_stats.total_scanned, 1);
    }

    #[test]
    fn test_start_without_image_is_noop() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        assert!(!flow.start_scan(&mut store));
        assert_eq!(flow.state(), &FlowState::Idle);
        assert!(!store.snapshot().is_scanning);
    }

    #[test]
    fn test_second_trigger_while_scanning_is_noop() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());

        store.set_scanning(true);
        assert!(!flow.start_scan(&mut store));
        store.set_scanning(false);

        assert!(flow.start_scan(&mut store));
        assert!(!flow.start_scan(&mut store));
        assert!(flow.finish_flash(&mut store));
        assert!(!flow.start_scan(&mut store));
        assert!(flow.complete(&mut store, genuine()));

        assert_eq!(store.snapshot().scan_history.len(), 1);
        assert_eq!(store.snapshot().shift_stats.total_scanned, 1);
    }

    #[test]
    fn test_out_of_order_events_are_rejected() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());

        assert!(!flow.finish_flash(&mut store));
        assert!(!flow.complete(&mut store, genuine()));

        flow.start_scan(&mut store);
        assert!(!flow.complete(&mut store, genuine()));
        assert!(flow.finish_flash(&mut store));
        assert!(!flow.finish_flash(&mut store));
        assert!(flow.complete(&mut store, genuine()));
        assert!(!flow.complete(&mut store, genuine()));

        assert_eq!(store.snapshot().shift_stats.total_scanned, 1);
    }

    #[test]
    fn test_select_and_clear_rejected_while_scanning() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());
        flow.start_scan(&mut store);

        assert!(!flow.select_image(&mut store, ImageRef::bytes("other.png", vec![1u8])));
        assert!(!flow.clear_image(&mut store));
        assert_eq!(flow.selected_image(), Some(&image()));
    }

    #[test]
    fn test_abort_returns_to_ready_without_stats() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());
        flow.start_scan(&mut store);
        flow.finish_flash(&mut store);

        assert!(flow.abort_scan(&mut store));
        assert_eq!(flow.state().name(), "ready");
        let state = store.snapshot();
        assert!(!state.is_scanning);
        assert!(state.captured_image.is_none());
        assert_eq!(state.shift_stats.total_scanned, 0);
        assert!(!flow.abort_scan(&mut store));
    }

    #[test]
    fn test_select_new_image_resets_viewport_and_result() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());
        flow.viewport_mut().set_zoom(2.5);
        run_to_result(&mut flow, &mut store);

        let other = ImageRef::bytes("other.png", vec![7u8]);
        assert!(flow.select_image(&mut store, other.clone()));
        assert_eq!(flow.viewport().zoom(), 1.0);
        assert_eq!(flow.state(), &FlowState::Ready { image: other });
        assert!(store.snapshot().scan_result.is_none());
    }

    #[test]
    fn test_clear_image_returns_to_idle() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());
        run_to_result(&mut flow, &mut store);

        assert!(flow.clear_image(&mut store));
        assert_eq!(flow.state(), &FlowState::Idle);
        assert!(flow.selected_image().is_none());
        assert_eq!(store.snapshot().shift_stats.total_scanned, 1);
    }

    #[test]
    fn test_keyboard_bindings() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();

        assert_eq!(flow.handle_key(&mut store, Key::Space), KeyOutcome::SelectImage);
        assert_eq!(flow.handle_key(&mut store, Key::Enter), KeyOutcome::Ignored);

        flow.select_image(&mut store, image());
        assert_eq!(flow.handle_key(&mut store, Key::Enter), KeyOutcome::Ignored);
        assert_eq!(flow.handle_key(&mut store, Key::Space), KeyOutcome::ScanStarted);

        assert_eq!(flow.handle_key(&mut store, Key::Space), KeyOutcome::Ignored);
        assert_eq!(flow.handle_key(&mut store, Key::Enter), KeyOutcome::Ignored);

        flow.finish_flash(&mut store);
        flow.complete(&mut store, genuine());
        assert_eq!(flow.handle_key(&mut store, Key::Space), KeyOutcome::Ignored);
        assert_eq!(flow.handle_key(&mut store, Key::Enter), KeyOutcome::NextScan);
        assert_eq!(flow.state().name(), "ready");
    }

    #[test]
    fn test_space_ignored_when_store_reports_scanning() {
        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());
        store.set_scanning(true);
        assert_eq!(flow.handle_key(&mut store, Key::Space), KeyOutcome::Ignored);
    }

    #[test]
    fn test_subscribers_never_see_result_while_scanning() {
        use std::sync::{Arc, Mutex};

        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        flow.select_image(&mut store, image());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |state| {
            sink.lock().unwrap().push((
                state.is_scanning,
                state.scan_result.is_some(),
                state.shift_stats.total_scanned,
            ));
        });

        run_to_result(&mut flow, &mut store);
        flow.next_scan(&mut store);

        let seen = seen.lock().unwrap();
        assert!(seen.iter().all(|(scanning, has_result, _)| !(*scanning && *has_result)));
        assert!(seen.iter().all(|(_, has_result, total)| !*has_result || *total == 1));
        assert!(seen.contains(&(false, true, 1)));
    }

    #[test]
    fn test_select_image_notifies_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut store = AppStore::default();
        let mut flow = InspectionFlow::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(flow.select_image(&mut store, image()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(store.snapshot().captured_image.is_none());
    }
}
