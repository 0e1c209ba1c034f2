//! 検査結果の表示用データ
//!
//! ScanResult から表示項目を決定的に導出する。値がない項目は
//! セクションごと省略し、決められた箇所だけ "N/A" などで埋める。
//! CLI は `Display` でテキスト表示し、デスクトップ版は各フィールドを描画する。

use crate::types::*;
use std::fmt;

pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 0.25;
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_REASON: &str = "No reason provided";
/// 表のセルが空のときの表示
pub const EMPTY_CELL: &str = "—";

/// 表示上の色分け
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Pass,
    Fail,
    Attention,
    Neutral,
}

impl Tone {
    fn mark(self) -> &'static str {
        match self {
            Tone::Pass => "✔",
            Tone::Fail => "✘",
            Tone::Attention => "⚠",
            Tone::Neutral => "-",
        }
    }
}

/// 判定バッジ（期待値と完全一致ならPass）
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

impl Badge {
    fn new(label: &'static str, value: &str, expected: &str) -> Self {
        Self {
            label,
            value: value.to_string(),
            tone: if value == expected { Tone::Pass } else { Tone::Fail },
        }
    }

    fn optional(label: &'static str, value: Option<&str>, expected: &str) -> Option<Self> {
        value.map(|v| Self::new(label, v, expected))
    }
}

/// ラベルと値の組
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

fn field(label: &'static str, value: Option<&str>) -> Option<Field> {
    value.map(|v| Field { label, value: v.to_string() })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub status: StatusView,
    pub branch_a: Option<BranchAView>,
    pub branch_b: Option<BranchBView>,
    pub traceability: Option<TraceabilityView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub status: OverallStatus,
    pub tone: Tone,
    /// 0–1
    pub confidence: f64,
    /// FAKE / REVIEW_NEEDED のときのみ
    pub reason: Option<String>,
}

impl StatusView {
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchAView {
    pub passed: bool,
    pub anomaly_score: f64,
    pub threshold: f64,
    pub suspicious: bool,
    /// スコア/閾値（1で頭打ち）
    pub gauge: f64,
    pub texture: Option<TextureView>,
    /// Noneならセクションなし、空なら異常なし
    pub physical_flags: Option<Vec<&'static str>>,
    pub preprocessed_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureView {
    pub anomalous_regions: u32,
    pub max_entropy: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchBView {
    pub passed: bool,
    pub ocr: Option<OcrView>,
    pub datasheet: Option<DatasheetView>,
    pub layout: Option<LayoutView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrView {
    pub fields: Vec<Field>,
    pub matches: Vec<Badge>,
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasheetView {
    pub status: Badge,
    pub source: Vec<Field>,
    pub source_url: Option<String>,
    pub marking_rules: Option<Vec<Field>>,
    pub rule_parsing: Option<Badge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutView {
    pub check: Badge,
    pub deviations: Option<Vec<Field>>,
    pub flags: Option<Vec<&'static str>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceabilityView {
    pub fields: Vec<Field>,
    pub image_references: Option<Vec<Field>>,
    /// ルールIDがなければ "N/A"
    pub rule_id: Option<String>,
    pub override_status: Option<Badge>,
    pub override_comments: Option<String>,
}

impl From<&ScanResult> for ResultView {
    fn from(result: &ScanResult) -> Self {
        Self {
            status: status_view(result),
            branch_a: result.branch_a.as_ref().map(branch_a_view),
            branch_b: result.branch_b.as_ref().map(branch_b_view),
            traceability: result.traceability.as_ref().map(traceability_view),
        }
    }
}

pub fn status_tone(status: OverallStatus) -> Tone {
    match status {
        OverallStatus::Genuine => Tone::Pass,
        OverallStatus::Fake => Tone::Fail,
        OverallStatus::ReviewNeeded => Tone::Attention,
    }
}

fn status_view(result: &ScanResult) -> StatusView {
    let status = result.status();
    let reason = match status {
        OverallStatus::Genuine => None,
        OverallStatus::Fake | OverallStatus::ReviewNeeded => {
            Some(result.failure_reason().unwrap_or(NO_REASON).to_string())
        }
    };

    StatusView {
        status,
        tone: status_tone(status),
        confidence: result.confidence_score(),
        reason,
    }
}

fn branch_a_view(a: &BranchA) -> BranchAView {
    let anomaly_score = a.autoencoder_anomaly_score.unwrap_or(0.0);
    let threshold = a
        .anomaly_threshold
        .filter(|t| *t > 0.0)
        .unwrap_or(DEFAULT_ANOMALY_THRESHOLD);

    let physical_flags = a.physical_flags.as_ref().map(|flags| {
        let mut list = Vec::new();
        if flags.possible_resurfacing {
            list.push("Possible resurfacing / sanding detected");
        }
        if flags.non_uniform_texture {
            list.push("Non-uniform texture detected");
        }
        list
    });

    BranchAView {
        passed: a.result.as_deref() == Some("PASS"),
        anomaly_score,
        threshold,
        suspicious: anomaly_score > threshold,
        gauge: (anomaly_score / threshold).clamp(0.0, 1.0),
        texture: a.texture_anomaly.as_ref().map(|t| TextureView {
            anomalous_regions: t.number_of_anomalous_regions.unwrap_or(0),
            max_entropy: t
                .max_entropy_patch
                .map(|e| format!("{:.2}", e))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }),
        physical_flags,
        preprocessed_image_url: a.preprocessed_image_url.clone(),
    }
}

fn branch_b_view(b: &BranchB) -> BranchBView {
    BranchBView {
        passed: b.overall_result.as_deref() == Some("PASS"),
        ocr: b.ocr_verification.as_ref().map(ocr_view),
        datasheet: b.datasheet_verification.as_ref().map(datasheet_view),
        layout: b.layout_verification.as_ref().map(layout_view),
    }
}

fn ocr_view(ocr: &OcrVerification) -> OcrView {
    let fields = ocr
        .extracted_fields
        .as_ref()
        .map(|f| {
            [
                field("Part Number", f.part_number.as_deref()),
                field("Manufacturer", f.manufacturer.as_deref()),
                field("Lot Code", f.lot_code.as_deref()),
            ]
            .into_iter()
            .flatten()
            .collect()
        })
        .unwrap_or_default();

    let matches = ocr
        .text_match_result
        .as_ref()
        .map(|m| {
            [
                Badge::optional("Part Number Match", m.part_number_match.as_deref(), "MATCH"),
                Badge::optional("Manufacturer Match", m.manufacturer_match.as_deref(), "MATCH"),
                Badge::optional("Lot/Date Format", m.lot_date_format.as_deref(), "VALID"),
            ]
            .into_iter()
            .flatten()
            .collect()
        })
        .unwrap_or_default();

    OcrView {
        fields,
        matches,
        confidence: ocr
            .ocr_confidence
            .filter(|c| *c > 0.0)
            .map(|c| format!("{:.1}%", c * 100.0)),
    }
}

fn datasheet_view(ds: &DatasheetVerification) -> DatasheetView {
    let source = ds
        .oem_source_info
        .as_ref()
        .map(|s| {
            [
                field("OEM", s.oem_name.as_deref()),
                field("Datasheet", s.datasheet_title.as_deref()),
                field("Version", s.version.as_deref()),
            ]
            .into_iter()
            .flatten()
            .collect()
        })
        .unwrap_or_default();

    DatasheetView {
        status: Badge::new(
            "Datasheet Status",
            ds.datasheet_status.as_deref().unwrap_or(NOT_AVAILABLE),
            "FOUND",
        ),
        source,
        source_url: ds.oem_source_info.as_ref().and_then(|s| s.source_url.clone()),
        marking_rules: ds.marking_rule_summary.as_ref().map(|m| {
            [
                field("Package", m.expected_package_type.as_deref()),
                field("Top Marking", m.expected_top_marking.as_deref()),
            ]
            .into_iter()
            .flatten()
            .collect()
        }),
        rule_parsing: Badge::optional("Rule Parsing", ds.rule_parsing_status.as_deref(), "SUCCESS"),
    }
}

fn layout_view(layout: &LayoutVerification) -> LayoutView {
    let px = |v: Option<f64>| v.map(|d| format!("{:.1} px", d));

    LayoutView {
        check: Badge::new(
            "Layout Check",
            layout.layout_check_result.as_deref().unwrap_or(NOT_AVAILABLE),
            "PASS",
        ),
        deviations: layout.position_deviation.as_ref().map(|d| {
            [
                field("Logo Deviation", px(d.logo_deviation).as_deref()),
                field("Text Block Deviation", px(d.text_block_deviation).as_deref()),
            ]
            .into_iter()
            .flatten()
            .collect()
        }),
        flags: layout.layout_flags.as_ref().map(|f| {
            let mut list = Vec::new();
            if f.text_misaligned {
                list.push("Text present but misaligned");
            }
            if f.logo_missing {
                list.push("Logo missing");
            }
            if f.extra_unknown_marking {
                list.push("Extra unknown marking detected");
            }
            list
        }),
    }
}

fn traceability_view(t: &Traceability) -> TraceabilityView {
    let timestamp = t.timestamp.as_deref().map(format_timestamp);

    TraceabilityView {
        fields: [
            field("Inspection ID", t.inspection_id.as_deref()),
            field("Timestamp", timestamp.as_deref()),
            field("Station ID", t.station_id.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect(),
        image_references: t.image_references.as_ref().map(|r| {
            [
                field("Captured", r.captured_image_id.as_deref()),
                field("Registered", r.registered_image_id.as_deref()),
                field("Heatmap", r.anomaly_heatmap_id.as_deref()),
            ]
            .into_iter()
            .flatten()
            .collect()
        }),
        rule_id: t.rule_source_reference.as_ref().map(|r| {
            r.rule_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        }),
        override_status: t
            .operator_override
            .as_ref()
            .and_then(|o| Badge::optional("Operator Override", o.override_status.as_deref(), "NONE")),
        override_comments: t
            .operator_override
            .as_ref()
            .and_then(|o| o.operator_comments.clone()),
    }
}

/// RFC 3339ならローカル時刻に整形、そうでなければそのまま
pub fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[Field]) -> fmt::Result {
    for item in fields {
        writeln!(f, "    {:<22} {}", item.label, item.value)?;
    }
    Ok(())
}

fn write_badge(f: &mut fmt::Formatter<'_>, badge: &Badge) -> fmt::Result {
    writeln!(f, "    {:<22} {} {}", badge.label, badge.tone.mark(), badge.value)
}

fn pass_fail(passed: bool) -> &'static str {
    if passed { "PASS" } else { "FAIL" }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = &self.status;
        writeln!(
            f,
            "{} {}  (confidence {})",
            status.tone.mark(),
            status.status,
            status.confidence_percent()
        )?;
        if let Some(reason) = &status.reason {
            writeln!(f, "  Reason: {}", reason)?;
        }

        if let Some(a) = &self.branch_a {
            writeln!(f, "\n[Branch A] Physical Integrity: {}", pass_fail(a.passed))?;
            writeln!(
                f,
                "    {:<22} {:.3} (threshold {}, {})",
                "Anomaly Score",
                a.anomaly_score,
                a.threshold,
                if a.suspicious { "Suspicious" } else { "Normal" }
            )?;
            if let Some(t) = &a.texture {
                writeln!(f, "    {:<22} {}", "Anomalous Regions", t.anomalous_regions)?;
                writeln!(f, "    {:<22} {}", "Max Entropy Patch", t.max_entropy)?;
            }
            if let Some(flags) = &a.physical_flags {
                if flags.is_empty() {
                    writeln!(f, "    ✔ No physical anomalies detected")?;
                }
                for flag in flags {
                    writeln!(f, "    ⚠ {}", flag)?;
                }
            }
            if let Some(url) = &a.preprocessed_image_url {
                writeln!(f, "    {:<22} {}", "Preprocessed Image", url)?;
            }
        }

        if let Some(b) = &self.branch_b {
            writeln!(f, "\n[Branch B] Data & Marking: {}", pass_fail(b.passed))?;
            if let Some(ocr) = &b.ocr {
                writeln!(f, "  B1 OCR & Text Verification")?;
                write_fields(f, &ocr.fields)?;
                for badge in &ocr.matches {
                    write_badge(f, badge)?;
                }
                if let Some(c) = &ocr.confidence {
                    writeln!(f, "    {:<22} {}", "OCR Confidence", c)?;
                }
            }
            if let Some(ds) = &b.datasheet {
                writeln!(f, "  B2 Datasheet & Rule Extraction")?;
                write_badge(f, &ds.status)?;
                write_fields(f, &ds.source)?;
                if let Some(url) = &ds.source_url {
                    writeln!(f, "    {:<22} {}", "Source", url)?;
                }
                if let Some(rules) = &ds.marking_rules {
                    write_fields(f, rules)?;
                }
                if let Some(badge) = &ds.rule_parsing {
                    write_badge(f, badge)?;
                }
            }
            if let Some(layout) = &b.layout {
                writeln!(f, "  B3 Layout & Position Check")?;
                write_badge(f, &layout.check)?;
                if let Some(devs) = &layout.deviations {
                    write_fields(f, devs)?;
                }
                for flag in layout.flags.iter().flatten() {
                    writeln!(f, "    ⚠ {}", flag)?;
                }
            }
        }

        if let Some(t) = &self.traceability {
            writeln!(f, "\n[Traceability]")?;
            write_fields(f, &t.fields)?;
            if let Some(refs) = &t.image_references {
                write_fields(f, refs)?;
            }
            if let Some(rule) = &t.rule_id {
                writeln!(f, "    {:<22} {}", "Rule Source", rule)?;
            }
            if let Some(badge) = &t.override_status {
                writeln!(f, "    {:<22} {}", badge.label, badge.value)?;
            }
            if let Some(comments) = &t.override_comments {
                writeln!(f, "    {:<22} {}", "Comments", comments)?;
            }
        }
        Ok(())
    }
}

/// 履歴表の1行
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub inspection_id: String,
    pub part_number: String,
    pub timestamp: String,
    pub status: OverallStatus,
    pub reason: String,
}

impl From<&ScanResult> for HistoryRow {
    fn from(result: &ScanResult) -> Self {
        let cell = |v: Option<&str>| v.map(str::to_string).unwrap_or_else(|| EMPTY_CELL.to_string());
        let timestamp = result
            .timestamp
            .as_deref()
            .or_else(|| result.traceability.as_ref()?.timestamp.as_deref())
            .map(format_timestamp);

        Self {
            inspection_id: cell(result.inspection_id()),
            part_number: cell(result.part_number()),
            timestamp: cell(timestamp.as_deref()),
            status: result.status(),
            reason: cell(result.failure_reason()),
        }
    }
}
