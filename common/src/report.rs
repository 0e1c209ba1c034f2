//! シフト終了レポート・不具合報告
//!
//! 現在の作業者とシフト統計に、作業者の入力（所見メモ・治具の状態）を
//! 加えて送信用のレポートを組み立てる。

use crate::store::AppState;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 治具の状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JigCondition {
    #[default]
    Okay,
    NeedsCleaning,
    NeedsRepair,
}

impl JigCondition {
    pub const ALL: [JigCondition; 3] = [
        JigCondition::Okay,
        JigCondition::NeedsCleaning,
        JigCondition::NeedsRepair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JigCondition::Okay => "okay",
            JigCondition::NeedsCleaning => "needs-cleaning",
            JigCondition::NeedsRepair => "needs-repair",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JigCondition::Okay => "Okay",
            JigCondition::NeedsCleaning => "Needs Cleaning",
            JigCondition::NeedsRepair => "Needs Repair",
        }
    }
}

impl fmt::Display for JigCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JigCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "okay" | "ok" => Ok(JigCondition::Okay),
            "needs-cleaning" | "cleaning" => Ok(JigCondition::NeedsCleaning),
            "needs-repair" | "repair" => Ok(JigCondition::NeedsRepair),
            _ => Err(format!(
                "Unknown jig condition: {}. Use okay, needs-cleaning, or needs-repair",
                s
            )),
        }
    }
}

/// `POST /reports` に送るシフトレポート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM:SS
    pub time: String,
    pub operator_name: String,
    pub shift_id: String,
    pub total_scanned: u32,
    pub pass_count: u32,
    pub fail_count: u32,
    pub fakes_found: u32,
    pub anomalies_note: String,
    pub jig_condition: JigCondition,
}

/// 作業者の入力欄
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportForm {
    pub anomalies_note: String,
    pub jig_condition: JigCondition,
}

impl ReportForm {
    /// 現在時刻でレポートを組み立てる
    pub fn build_report(&self, state: &AppState) -> ShiftReport {
        self.build_report_at(state, Local::now())
    }

    pub fn build_report_at(&self, state: &AppState, now: DateTime<Local>) -> ShiftReport {
        let stats = state.shift_stats;
        ShiftReport {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            operator_name: state.worker.name.clone(),
            shift_id: state.worker.shift_id.clone(),
            total_scanned: stats.total_scanned,
            pass_count: stats.pass_count,
            fail_count: stats.fail_count,
            fakes_found: stats.fakes_found,
            anomalies_note: self.anomalies_note.clone(),
            jig_condition: self.jig_condition,
        }
    }
}

/// 不具合の区分
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    WrongVerdict,
    Hardware,
    Software,
    #[default]
    Other,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::WrongVerdict,
        IssueCategory::Hardware,
        IssueCategory::Software,
        IssueCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IssueCategory::WrongVerdict => "Wrong verdict",
            IssueCategory::Hardware => "Hardware",
            IssueCategory::Software => "Software",
            IssueCategory::Other => "Other",
        }
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "wrong-verdict" | "verdict" => Ok(IssueCategory::WrongVerdict),
            "hardware" => Ok(IssueCategory::Hardware),
            "software" => Ok(IssueCategory::Software),
            "other" => Ok(IssueCategory::Other),
            _ => Err(format!(
                "Unknown category: {}. Use wrong-verdict, hardware, software, or other",
                s
            )),
        }
    }
}

/// `POST /issues` に送る不具合報告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub category: IssueCategory,
    pub description: String,
    pub operator_name: String,
    pub shift_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<String>,
    pub reported_at: String,
}

impl IssueReport {
    /// 現在の結果があればその検査IDを紐づける
    pub fn new(state: &AppState, category: IssueCategory, description: impl Into<String>) -> Self {
        Self {
            category,
            description: description.into(),
            operator_name: state.worker.name.clone(),
            shift_id: state.worker.shift_id.clone(),
            inspection_id: state
                .scan_result
                .as_ref()
                .and_then(|r| r.inspection_id())
                .map(str::to_string),
            reported_at: Local::now().to_rfc3339(),
        }
    }
}
