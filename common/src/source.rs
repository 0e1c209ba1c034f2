//! 検査結果の取得元

use crate::demo;
use crate::error::Result;
use crate::store::ImageRef;
use crate::types::ScanResult;
use async_trait::async_trait;

/// 撮影画像から検査結果を得る
#[async_trait]
pub trait ResultSource: Send + Sync {
    async fn analyze(&self, image: &ImageRef) -> Result<ScanResult>;
}

/// バックエンドを使わずにデモ結果を返す
#[derive(Debug, Clone)]
pub struct DemoSource {
    station_id: String,
    /// 固定の判定（Noneならランダム）
    verdict: Option<bool>,
}

impl DemoSource {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self { station_id: station_id.into(), verdict: None }
    }

    pub fn with_verdict(mut self, genuine: bool) -> Self {
        self.verdict = Some(genuine);
        self
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new(demo::DEFAULT_STATION_ID)
    }
}

#[async_trait]
impl ResultSource for DemoSource {
    async fn analyze(&self, _image: &ImageRef) -> Result<ScanResult> {
        Ok(match self.verdict {
            Some(genuine) => demo::demo_result(genuine, &self.station_id),
            None => demo::random_result(&mut rand::thread_rng(), &self.station_id),
        })
    }
}
