//! バックエンドAPIクライアント
//!
//! 検査ロジックはすべてバックエンド側にあり、ここではJSONを送受信するだけ。
//! 自動リトライはしない。

use crate::error::{Error, Result};
use crate::report::{IssueReport, ShiftReport};
use crate::source::ResultSource;
use crate::store::ImageRef;
use crate::submit::ReportTransport;
use crate::types::ScanResult;
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde_json::Value;
use std::time::Duration;

pub use crate::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// ライブ映像の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Available { url: String, content_type: String },
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "backend request failed");
        Err(Error::Status { status: status.as_u16(), body })
    }

    /// ハードウェアカメラで撮影させる
    pub async fn trigger_scan(&self) -> Result<Value> {
        let response = self.client.post(self.api_url("/scan/trigger")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// 撮影済み画像を解析させる（multipart, field `image`）
    pub async fn scan_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<ScanResult> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;
        let form = multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(self.api_url("/scan"))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// 前処理済み画像などバックエンド上の画像を取得（相対パスはベースURL基準）
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(url);
        let response = self.client.get(&url).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    pub fn video_stream_url(&self) -> String {
        self.api_url("/video/stream")
    }

    /// ライブ映像が取得できるか確認する（再試行しない）
    pub async fn probe_stream(&self) -> StreamStatus {
        let url = self.video_stream_url();
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return StreamStatus::Unavailable(e.to_string()),
        };

        if !response.status().is_success() {
            return StreamStatus::Unavailable(format!("HTTP {}", response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with("multipart/x-mixed-replace") || content_type.starts_with("image/") {
            StreamStatus::Available { url, content_type }
        } else {
            StreamStatus::Unavailable(format!("Unsupported stream type: {content_type}"))
        }
    }

    /// 直近の検査結果を最大 `limit` 件取得
    pub async fn scan_history(&self, limit: usize) -> Result<Vec<ScanResult>> {
        let response = self
            .client
            .get(self.api_url("/scans"))
            .query(&[("limit", limit)])
            .send()
            .await?;
        let mut results: Vec<ScanResult> = Self::check(response).await?.json().await?;
        results.truncate(limit);
        Ok(results)
    }

    pub async fn submit_report(&self, report: &ShiftReport) -> Result<Value> {
        let response = self
            .client
            .post(self.api_url("/reports"))
            .json(report)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn report_issue(&self, issue: &IssueReport) -> Result<Value> {
        let response = self
            .client
            .post(self.api_url("/issues"))
            .json(issue)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl ReportTransport for ApiClient {
    async fn send_report(&self, report: &ShiftReport) -> Result<Value> {
        self.submit_report(report).await
    }
}

#[async_trait]
impl ResultSource for ApiClient {
    async fn analyze(&self, image: &ImageRef) -> Result<ScanResult> {
        match image {
            ImageRef::Bytes { name, data } => self.scan_image(name, data.to_vec()).await,
            ImageRef::Url(url) => Err(Error::Config(format!("cannot upload remote image: {url}"))),
        }
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
