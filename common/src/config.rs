//! ステーション設定
//!
//! CLIとデスクトップ版が同じ `~/.config/ic-inspect/config.json` を読む。

use crate::demo::DEFAULT_STATION_ID;
use crate::error::{Error, Result};
use crate::store::{Theme, Worker};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// バックエンドURLを上書きする環境変数
pub const BASE_URL_ENV: &str = "IC_INSPECT_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub api_base_url: Option<String>,
    pub timeout_seconds: u64,
    pub operator_name: String,
    pub shift_id: String,
    pub station_id: String,
    pub theme: Theme,
    pub demo_mode: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        let worker = Worker::default();
        Self {
            api_base_url: None,
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            operator_name: worker.name,
            shift_id: worker.shift_id,
            station_id: DEFAULT_STATION_ID.into(),
            theme: Theme::default(),
            demo_mode: false,
        }
    }
}

impl StationConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// ファイルがなければ既定値
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: StationConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("ic-inspect").join("config.json"))
    }

    /// バックエンドURL（環境変数 > 設定ファイル > 既定値）
    pub fn base_url(&self) -> String {
        self.resolve_base_url(std::env::var(BASE_URL_ENV).ok())
    }

    fn resolve_base_url(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn worker(&self) -> Worker {
        Worker {
            name: self.operator_name.clone(),
            shift_id: self.shift_id.clone(),
        }
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(format!(
                "URLは http:// または https:// で始めてください: {}",
                url
            )));
        }
        self.api_base_url = Some(url.trim_end_matches('/').to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = StationConfig::default();
        assert_eq!(config.operator_name, "Operator 001");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(!config.demo_mode);
    }

    #[test]
    fn test_base_url_precedence() {
        let mut config = StationConfig::default();
        assert_eq!(config.resolve_base_url(None), "http://localhost:8000");

        config.set_base_url("http://station-pi:8000/".into()).unwrap();
        assert_eq!(config.resolve_base_url(None), "http://station-pi:8000");
        assert_eq!(config.resolve_base_url(Some("  ".into())), "http://station-pi:8000");
        assert_eq!(
            config.resolve_base_url(Some("https://qa.example:9000".into())),
            "https://qa.example:9000"
        );
    }

    #[test]
    fn test_set_base_url_rejects_bad_scheme() {
        let mut config = StationConfig::default();
        let err = config.set_base_url("station-pi:8000".into()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("config.json");

        let mut config = StationConfig::default();
        config.operator_name = "Operator 014".into();
        config.theme = Theme::Light;
        config.save_to(&path).expect("保存失敗");

        let loaded = StationConfig::load_from(&path).expect("読み込み失敗");
        assert_eq!(loaded, config);
        assert_eq!(loaded.worker().name, "Operator 014");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"shift_id": "SHIFT-NIGHT", "theme": "light"}"#).unwrap();

        let config = StationConfig::load_from(&path).unwrap();
        assert_eq!(config.shift_id, "SHIFT-NIGHT");
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.operator_name, "Operator 001");
        assert_eq!(config.station_id, "STATION-001");
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = StationConfig::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, StationConfig::default());
    }
}
