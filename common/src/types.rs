//! 検査結果の型定義
//!
//! バックエンドのJSONレスポンスをそのまま受け取る型:
//! - ScanResult: 1回のスキャンの総合結果
//! - BranchA: 物理的完全性チェック（表面・テクスチャ異常）
//! - BranchB: 刻印・データチェック（OCR・データシート・レイアウト）
//! - Traceability: 監査用メタデータ

use serde::{Deserialize, Serialize};
use std::fmt;

/// 総合判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Genuine,
    Fake,
    ReviewNeeded,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Genuine => "GENUINE",
            OverallStatus::Fake => "FAKE",
            OverallStatus::ReviewNeeded => "REVIEW_NEEDED",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "GENUINE" => Ok(OverallStatus::Genuine),
            "FAKE" => Ok(OverallStatus::Fake),
            "REVIEW_NEEDED" | "REVIEW" => Ok(OverallStatus::ReviewNeeded),
            _ => Err(format!("Unknown status: {}. Use genuine, fake, or review_needed", s)),
        }
    }
}

/// 1回のスキャン結果
///
/// 生成後は変更しない。履歴には値として保持する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_status: Option<OverallStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_confidence_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_failure_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_a: Option<BranchA>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_b: Option<BranchB>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceability: Option<Traceability>,

    /// 履歴に追加した時刻（RFC 3339）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    // 旧形式のレスポンス（isGenuine/confidence/reason）
    #[serde(default, rename = "isGenuine", skip_serializing_if = "Option::is_none")]
    pub is_genuine: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ScanResult {
    /// 実効ステータス
    ///
    /// `overall_status` がなければ旧形式の `isGenuine` から判定する。
    pub fn status(&self) -> OverallStatus {
        match self.overall_status {
            Some(status) => status,
            None if self.is_genuine == Some(true) => OverallStatus::Genuine,
            None => OverallStatus::Fake,
        }
    }

    /// 実効信頼度（0–1）
    pub fn confidence_score(&self) -> f64 {
        self.overall_confidence_score
            .or(self.confidence)
            .unwrap_or(0.0)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.primary_failure_reason
            .as_deref()
            .or(self.reason.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn inspection_id(&self) -> Option<&str> {
        self.traceability.as_ref()?.inspection_id.as_deref()
    }

    pub fn part_number(&self) -> Option<&str> {
        self.branch_b
            .as_ref()?
            .ocr_verification
            .as_ref()?
            .extracted_fields
            .as_ref()?
            .part_number
            .as_deref()
    }

    pub fn preprocessed_image_url(&self) -> Option<&str> {
        self.branch_a.as_ref()?.preprocessed_image_url.as_deref()
    }
}

/// Branch A: 物理的完全性チェック
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchA {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoencoder_anomaly_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_anomaly: Option<TextureAnomaly>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_flags: Option<PhysicalFlags>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessed_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureAnomaly {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_anomalous_regions: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entropy_patch: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalFlags {
    pub possible_resurfacing: bool,
    pub non_uniform_texture: bool,
}

/// Branch B: 刻印・データチェック
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchB {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_verification: Option<OcrVerification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet_verification: Option<DatasheetVerification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_verification: Option<LayoutVerification>,
}

/// B1: OCR・テキスト照合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrVerification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_fields: Option<ExtractedFields>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_match_result: Option<TextMatchResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMatchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_date_format: Option<String>,
}

/// B2: データシート・ルール抽出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasheetVerification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oem_source_info: Option<OemSourceInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marking_rule_summary: Option<MarkingRuleSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_parsing_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OemSourceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oem_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkingRuleSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_package_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_top_marking: Option<String>,
}

/// B3: レイアウト・位置チェック
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutVerification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_check_result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_deviation: Option<PositionDeviation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_flags: Option<LayoutFlags>,
}

/// 位置ずれ（px）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionDeviation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_deviation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_block_deviation: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutFlags {
    pub text_misaligned: bool,
    pub logo_missing: bool,
    pub extra_unknown_marking: bool,
}

/// 監査用メタデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traceability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<String>,

    /// ISO 8601文字列（バックエンドの形式をそのまま保持）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_references: Option<ImageReferences>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_source_reference: Option<RuleSourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_override: Option<OperatorOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_heatmap_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSourceReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_comments: Option<String>,
}
