//! アプリケーション状態ストア
//!
//! スキャン状態・シフト統計・履歴を1か所で保持する。
//! 変更は定義済みのアクションからのみ行い、変更ごとに購読者へ
//! 不変スナップショットを同期的に通知する。

use crate::history::ScanHistory;
use crate::types::{OverallStatus, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 作業者（セッション中は不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub name: String,
    pub shift_id: String,
}

impl Default for Worker {
    fn default() -> Self {
        Self {
            name: "Operator 001".into(),
            shift_id: "SHIFT-2025-001".into(),
        }
    }
}

/// シフト統計
///
/// REVIEW_NEEDED は合否とは別枠で数える:
/// `total_scanned == pass_count + fail_count + review_needed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStats {
    pub total_scanned: u32,
    pub pass_count: u32,
    pub fail_count: u32,
    pub fakes_found: u32,
    pub review_needed: u32,
}

impl ShiftStats {
    fn record(&mut self, status: OverallStatus) {
        self.total_scanned += 1;
        match status {
            OverallStatus::Genuine => self.pass_count += 1,
            OverallStatus::Fake => {
                self.fail_count += 1;
                self.fakes_found += 1;
            }
            OverallStatus::ReviewNeeded => self.review_needed += 1,
        }
    }

    /// 合格率（%、四捨五入）。未スキャンなら0
    pub fn pass_rate_percent(&self) -> u32 {
        if self.total_scanned == 0 {
            return 0;
        }
        (f64::from(self.pass_count) / f64::from(self.total_scanned) * 100.0).round() as u32
    }
}

/// 表示テーマ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}. Use light or dark", s)),
        }
    }
}

/// 画像への参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// 読み込み済みの画像データ
    Bytes { name: String, data: Arc<[u8]> },
    /// バックエンド上の画像URL
    Url(String),
}

impl ImageRef {
    pub fn bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        ImageRef::Bytes { name: name.into(), data: data.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            ImageRef::Bytes { name, .. } => name,
            ImageRef::Url(url) => url,
        }
    }
}

/// ストアの状態（購読者にはスナップショットとして渡す）
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub is_scanning: bool,
    pub scan_result: Option<ScanResult>,
    pub captured_image: Option<ImageRef>,
    pub registered_image: Option<ImageRef>,
    pub worker: Worker,
    pub shift_stats: ShiftStats,
    pub scan_history: ScanHistory,
    pub theme: Theme,
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&AppState) + Send>;

/// 状態コンテナ
///
/// プロセス全体で1つを所有者が保持し、必要な箇所へ参照で渡す。
pub struct AppStore {
    state: Arc<AppState>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: SubscriptionId,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(Worker::default())
    }
}

impl fmt::Debug for AppStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AppStore {
    pub fn new(worker: Worker) -> Self {
        Self {
            state: Arc::new(AppState { worker, ..Default::default() }),
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// 現在の状態の不変スナップショット
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// 変更通知を購読
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn update(&mut self, action: &str, mutate: impl FnOnce(&mut AppState)) {
        mutate(Arc::make_mut(&mut self.state));
        tracing::debug!(action, "store updated");

        let state = Arc::clone(&self.state);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&state);
        }
    }

    pub fn set_scanning(&mut self, scanning: bool) {
        self.update("set_scanning", |s| s.is_scanning = scanning);
    }

    pub fn set_scan_result(&mut self, result: Option<ScanResult>) {
        self.update("set_scan_result", |s| s.scan_result = result);
    }

    pub fn set_captured_image(&mut self, image: Option<ImageRef>) {
        self.update("set_captured_image", |s| s.captured_image = image);
    }

    pub fn set_registered_image(&mut self, image: Option<ImageRef>) {
        self.update("set_registered_image", |s| s.registered_image = image);
    }

    /// 完了したスキャンを記録する。シフト統計の唯一の更新点。
    ///
    /// 1スキャンにつき1回だけ呼ぶこと。
    pub fn add_scan_result(&mut self, result: ScanResult) {
        let status = result.status();
        self.update("add_scan_result", |s| {
            s.scan_history.push(result);
            s.shift_stats.record(status);
        });
        tracing::info!(%status, total = self.state.shift_stats.total_scanned, "scan recorded");
    }

    /// 解析結果を確定する
    ///
    /// 結果・参照画像・履歴・統計・スキャンフラグを1回の更新で書き換えるため、
    /// 購読者がスキャン中のまま結果を持つ状態を見ることはない。
    pub fn finish_scan(&mut self, result: ScanResult, registered: Option<ImageRef>) {
        let status = result.status();
        self.update("finish_scan", |s| {
            s.scan_history.push(result.clone());
            s.shift_stats.record(status);
            s.scan_result = Some(result);
            s.registered_image = registered;
            s.is_scanning = false;
        });
        tracing::info!(%status, total = self.state.shift_stats.total_scanned, "scan recorded");
    }

    /// 一時的なスキャン状態をクリア（履歴・統計は保持）
    pub fn reset_scan(&mut self) {
        self.update("reset_scan", |s| {
            s.is_scanning = false;
            s.scan_result = None;
            s.captured_image = None;
            s.registered_image = None;
        });
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.update("set_theme", |s| s.theme = theme);
    }
}
