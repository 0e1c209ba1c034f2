//! デモ用の検査結果生成
//!
//! バックエンドなしで画面を確認するための結果を組み立てる。
//! 約7割をGENUINEとし、構造はバックエンドのレスポンスと同じにする。

use crate::types::*;
use chrono::Utc;
use rand::Rng;

/// GENUINEになる確率
pub const GENUINE_PROBABILITY: f64 = 0.7;

pub const DEFAULT_STATION_ID: &str = "STATION-001";

/// ランダムにデモ結果を生成
pub fn random_result<R: Rng + ?Sized>(rng: &mut R, station_id: &str) -> ScanResult {
    demo_result(rng.gen_bool(GENUINE_PROBABILITY), station_id)
}

/// 判定を指定してデモ結果を生成
pub fn demo_result(genuine: bool, station_id: &str) -> ScanResult {
    let now = Utc::now();
    let stamp = now.timestamp_millis();
    let pick = |pass: &str, fail: &str| Some(if genuine { pass } else { fail }.to_string());

    ScanResult {
        overall_status: Some(if genuine { OverallStatus::Genuine } else { OverallStatus::Fake }),
        overall_confidence_score: Some(if genuine { 0.95 } else { 0.87 }),
        primary_failure_reason: (!genuine)
            .then(|| "Texture inconsistency (possible blacktopping)".to_string()),
        branch_a: Some(BranchA {
            result: pick("PASS", "FAIL"),
            autoencoder_anomaly_score: Some(if genuine { 0.12 } else { 0.34 }),
            anomaly_threshold: Some(0.25),
            texture_anomaly: Some(TextureAnomaly {
                number_of_anomalous_regions: Some(if genuine { 0 } else { 3 }),
                max_entropy_patch: Some(if genuine { 0.45 } else { 0.82 }),
            }),
            physical_flags: Some(PhysicalFlags {
                possible_resurfacing: !genuine,
                non_uniform_texture: !genuine,
            }),
            preprocessed_image_url: Some("/demo-registered.jpg".into()),
        }),
        branch_b: Some(BranchB {
            overall_result: pick("PASS", "FAIL"),
            ocr_verification: Some(OcrVerification {
                extracted_fields: Some(ExtractedFields {
                    part_number: Some("SN74HC273N".into()),
                    manufacturer: Some("TI".into()),
                    lot_code: Some("A23B".into()),
                }),
                text_match_result: Some(TextMatchResult {
                    part_number_match: Some("MATCH".into()),
                    manufacturer_match: pick("MATCH", "MISMATCH"),
                    lot_date_format: Some("VALID".into()),
                }),
                ocr_confidence: Some(0.92),
            }),
            datasheet_verification: Some(DatasheetVerification {
                datasheet_status: Some("FOUND".into()),
                oem_source_info: Some(OemSourceInfo {
                    oem_name: Some("Texas Instruments".into()),
                    datasheet_title: Some("SN74HC273 Octal D-Type Flip-Flop".into()),
                    version: Some("Rev. D".into()),
                    source_url: Some("https://www.ti.com/lit/ds/symlink/sn74hc273.pdf".into()),
                }),
                marking_rule_summary: Some(MarkingRuleSummary {
                    expected_package_type: Some("DIP-20".into()),
                    expected_top_marking: Some("SN74HC273N".into()),
                }),
                rule_parsing_status: Some("SUCCESS".into()),
            }),
            layout_verification: Some(LayoutVerification {
                layout_check_result: pick("PASS", "FAIL"),
                position_deviation: Some(PositionDeviation {
                    logo_deviation: Some(if genuine { 0.8 } else { 5.2 }),
                    text_block_deviation: Some(if genuine { 1.2 } else { 6.5 }),
                }),
                layout_flags: Some(LayoutFlags {
                    text_misaligned: !genuine,
                    logo_missing: false,
                    extra_unknown_marking: false,
                }),
            }),
        }),
        traceability: Some(Traceability {
            inspection_id: Some(format!("INSP-{stamp}")),
            timestamp: Some(now.to_rfc3339()),
            station_id: Some(station_id.to_string()),
            image_references: Some(ImageReferences {
                captured_image_id: Some(format!("IMG-{stamp}")),
                registered_image_id: Some(format!("REG-{stamp}")),
                anomaly_heatmap_id: None,
            }),
            rule_source_reference: Some(RuleSourceReference {
                rule_id: Some("RULE-SN74HC273N-001".into()),
            }),
            operator_override: Some(OperatorOverride {
                override_status: Some("NONE".into()),
                operator_comments: None,
            }),
        }),
        ..Default::default()
    }
}
