//! 設定ファイル
//!
//! 設定の中身と読み書きはデスクトップ版と共通（`ic_inspect_common::config`）。
//! 読み込み・保存のエラーは [`InspectError`](crate::error::InspectError) へ変換して扱う。

pub use ic_inspect_common::config::{StationConfig as Config, BASE_URL_ENV};
