//! レポート送信
//!
//! 失敗しても入力内容は保持し、そのまま再送できる状態に戻す。
//! シフト統計には一切触れない。

use crate::error::Result;
use crate::report::{ReportForm, ShiftReport};
use crate::store::AppState;
use async_trait::async_trait;
use serde_json::Value;

/// レポートの送信先
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn send_report(&self, report: &ShiftReport) -> Result<Value>;
}

#[derive(Debug, Clone, Default)]
pub struct ReportSubmitter {
    pub form: ReportForm,
    submitting: bool,
    submitted: bool,
}

impl ReportSubmitter {
    pub fn new(form: ReportForm) -> Self {
        Self { form, ..Default::default() }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn build_report(&self, state: &AppState) -> ShiftReport {
        self.form.build_report(state)
    }

    /// 送信を開始してレポートを組み立てる（送信中なら None）
    ///
    /// 送信を別タスクで行う場合に使い、結果は [`finish`](Self::finish) で戻す。
    pub fn begin(&mut self, state: &AppState) -> Option<ShiftReport> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        Some(self.build_report(state))
    }

    /// 送信結果を反映する。失敗時はフォームをそのまま残す。
    pub fn finish<T>(&mut self, outcome: &Result<T>) {
        self.submitting = false;
        match outcome {
            Ok(_) => {
                self.submitted = true;
                tracing::info!(note_len = self.form.anomalies_note.len(), "shift report submitted");
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to submit shift report");
            }
        }
    }

    /// 組み立てて送信する。エラーは呼び出し側で作業者に通知すること。
    pub async fn submit<T>(&mut self, transport: &T, state: &AppState) -> Result<Value>
    where
        T: ReportTransport + ?Sized,
    {
        let report = self.build_report(state);
        self.submitting = true;
        let outcome = transport.send_report(&report).await;
        self.finish(&outcome);
        outcome
    }

    /// 送信完了画面から新しいフォームへ戻る
    pub fn start_over(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::report::JigCondition;
    use crate::store::AppStore;
    use crate::types::{OverallStatus, ScanResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        fail: bool,
        sent: Mutex<Vec<ShiftReport>>,
    }

    #[async_trait]
    impl ReportTransport for Recorder {
        async fn send_report(&self, report: &ShiftReport) -> Result<Value> {
            if self.fail {
                return Err(Error::Connection("connection refused".into()));
            }
            self.sent.lock().unwrap().push(report.clone());
            Ok(serde_json::json!({ "status": "ok" }))
        }
    }

    fn form() -> ReportForm {
        ReportForm {
            anomalies_note: "Two chips with sanded tops".into(),
            jig_condition: JigCondition::NeedsRepair,
        }
    }

    #[tokio::test]
    async fn test_submit_success() {
        let mut store = AppStore::default();
        store.add_scan_result(ScanResult {
            overall_status: Some(OverallStatus::Fake),
            ..Default::default()
        });
        let transport = Recorder::default();
        let mut submitter = ReportSubmitter::new(form());

        submitter.submit(&transport, &store.snapshot()).await.expect("送信失敗");

        assert!(submitter.is_submitted());
        assert!(!submitter.is_submitting());
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].fakes_found, 1);
        assert_eq!(sent[0].jig_condition, JigCondition::NeedsRepair);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_form() {
        let mut store = AppStore::default();
        store.add_scan_result(ScanResult {
            overall_status: Some(OverallStatus::Genuine),
            ..Default::default()
        });
        let stats_before = store.snapshot().shift_stats;
        let transport = Recorder { fail: true, ..Default::default() };
        let mut submitter = ReportSubmitter::new(form());

        let err = submitter.submit(&transport, &store.snapshot()).await.unwrap_err();

        assert!(err.is_transport());
        assert!(!submitter.is_submitted());
        assert!(!submitter.is_submitting());
        assert_eq!(submitter.form, form());
        assert_eq!(store.snapshot().shift_stats, stats_before);
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let store = AppStore::default();
        let mut submitter = ReportSubmitter::new(form());

        let failing = Recorder { fail: true, ..Default::default() };
        assert!(submitter.submit(&failing, &store.snapshot()).await.is_err());

        let working = Recorder::default();
        assert!(submitter.submit(&working, &store.snapshot()).await.is_ok());
        assert!(submitter.is_submitted());
        assert_eq!(working.sent.lock().unwrap()[0].anomalies_note, "Two chips with sanded tops");

        submitter.start_over();
        assert!(!submitter.is_submitted());
        assert_eq!(submitter.form, ReportForm::default());
    }

    #[test]
    fn test_begin_blocks_double_submit() {
        let store = AppStore::default();
        let mut submitter = ReportSubmitter::new(form());

        let report = submitter.begin(&store.snapshot()).expect("最初の送信は開始できる");
        assert_eq!(report.jig_condition, JigCondition::NeedsRepair);
        assert!(submitter.is_submitting());
        assert!(submitter.begin(&store.snapshot()).is_none());

        submitter.finish::<Value>(&Err(Error::Timeout));
        assert!(!submitter.is_submitting());
        assert!(!submitter.is_submitted());
        assert_eq!(submitter.form, form());

        assert!(submitter.begin(&store.snapshot()).is_some());
        submitter.finish(&Ok(serde_json::json!({ "status": "ok" })));
        assert!(submitter.is_submitted());
    }
}
