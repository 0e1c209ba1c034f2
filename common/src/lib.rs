//! IC Inspect Common Library
//!
//! CLIとデスクトップ版で共有される状態・フロー・表示データ

pub mod types;
pub mod error;
pub mod config;
pub mod history;
pub mod store;
pub mod flow;
pub mod viewport;
pub mod render;
pub mod report;
pub mod demo;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod source;
#[cfg(feature = "client")]
pub mod submit;
#[cfg(feature = "client")]
pub mod schedule;

pub use types::{OverallStatus, ScanResult};
pub use error::{Error, Result};
pub use config::StationConfig;
pub use history::{ScanHistory, HISTORY_LIMIT};
pub use store::{AppState, AppStore, ImageRef, ShiftStats, Theme, Worker};
pub use flow::{FlowState, InspectionFlow, Key, KeyOutcome, ScanPhase, ScanTimings};
pub use viewport::Viewport;
pub use render::{HistoryRow, ResultView, Tone};
pub use report::{IssueCategory, IssueReport, JigCondition, ReportForm, ShiftReport};

#[cfg(feature = "client")]
pub use client::{ApiClient, StreamStatus};
#[cfg(feature = "client")]
pub use source::{DemoSource, ResultSource};
#[cfg(feature = "client")]
pub use submit::{ReportSubmitter, ReportTransport};
#[cfg(feature = "client")]
pub use schedule::{run_scan, ScheduledScan};
