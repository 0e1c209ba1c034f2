//! バックエンド通信テスト
//!
//! axum でバックエンドのルートを立て、ApiClient のリクエスト内容と
//! エラー時の挙動を検証

use axum::extract::{Multipart, RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use ic_inspect::batch;
use ic_inspect::error::InspectError;
use ic_inspect_common::{
    ApiClient, AppStore, Error, ImageRef, InspectionFlow, IssueCategory, IssueReport,
    JigCondition, OverallStatus, ReportForm, ReportSubmitter, ScanTimings, StreamStatus, Worker,
    run_scan,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

type Seen<T> = Arc<Mutex<Vec<T>>>;

/// アップロードされたmultipartフィールド
#[derive(Debug, Clone)]
struct Upload {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    len: usize,
}

/// ポート0で待ち受け、ベースURLを返す
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn fast() -> ScanTimings {
    ScanTimings {
        flash: Duration::from_millis(1),
        processing: Duration::from_millis(1),
    }
}

fn fake_result() -> Value {
    json!({
        "overall_status": "FAKE",
        "overall_confidence_score": 0.87,
        "primary_failure_reason": "Texture anomaly",
        "branch_a": {"result": "FAIL", "autoencoder_anomaly_score": 0.34, "anomaly_threshold": 0.25},
        "traceability": {"inspection_id": "INSP-42", "station_id": "STATION-009"}
    })
}

async fn fake_scan() -> Json<Value> {
    Json(fake_result())
}

async fn camera_offline() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "camera offline"})))
}

async fn record_upload(State(seen): State<Seen<Upload>>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.unwrap().len();
        seen.lock().unwrap().push(Upload { field: field_name, file_name, content_type, len });
    }
    Json(fake_result())
}

async fn record_json(State(seen): State<Seen<Value>>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(body);
    Json(json!({"id": 7}))
}

/// 画像解析: multipart の image フィールドで送信される
#[tokio::test]
async fn test_scan_image_posts_multipart() {
    let seen: Seen<Upload> = Arc::default();
    let app = Router::new()
        .route("/api/scan", post(record_upload))
        .with_state(seen.clone());
    let base_url = serve(app).await;

    let result = client(&base_url)
        .scan_image("chip.jpg", vec![0xff, 0xd8, 0xff, 0xe0])
        .await
        .unwrap();

    assert_eq!(result.status(), OverallStatus::Fake);
    assert_eq!(result.inspection_id(), Some("INSP-42"));

    let uploads = seen.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "image");
    assert_eq!(uploads[0].file_name.as_deref(), Some("chip.jpg"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(uploads[0].len, 4);
}

/// フロー経由でバックエンド解析を行うと統計と履歴に反映される
#[tokio::test]
async fn test_flow_scan_through_backend() {
    let base_url = serve(Router::new().route("/api/scan", post(fake_scan))).await;
    let source = Arc::new(client(&base_url));

    let mut store = AppStore::new(Worker::default());
    let mut flow = InspectionFlow::new();
    flow.select_image(&mut store, ImageRef::bytes("chip.jpg", vec![0xffu8, 0xd8]));

    assert!(run_scan(&mut flow, &mut store, source, fast()).await.unwrap());

    let state = store.snapshot();
    assert_eq!(state.shift_stats.total_scanned, 1);
    assert_eq!(state.shift_stats.fakes_found, 1);
    assert_eq!(state.scan_history.latest().and_then(|r| r.inspection_id()), Some("INSP-42"));
}

/// バックエンドのエラー応答はスキャンを中断し統計を変えない
#[tokio::test]
async fn test_backend_error_aborts_scan() {
    let base_url = serve(Router::new().route("/api/scan", post(camera_offline))).await;
    let source = Arc::new(client(&base_url));

    let mut store = AppStore::default();
    let mut flow = InspectionFlow::new();
    flow.select_image(&mut store, ImageRef::bytes("chip.jpg", vec![0xffu8, 0xd8]));

    let err = run_scan(&mut flow, &mut store, source, fast()).await.unwrap_err();

    match err {
        Error::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("camera offline"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(flow.state().name(), "ready");
    assert!(!store.snapshot().is_scanning);
    assert_eq!(store.snapshot().shift_stats.total_scanned, 0);
}

/// 1枚だけの検査が失敗したらエラーで終わる
#[tokio::test]
async fn test_single_image_scan_failure_is_error() {
    let base_url = serve(Router::new().route("/api/scan", post(camera_offline))).await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("chip.png");
    image::RgbImage::new(6, 6).save(&path).unwrap();

    let mut store = AppStore::default();
    let err = batch::scan_targets(&[path], &mut store, Arc::new(client(&base_url)), fast(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, InspectError::Backend(Error::Status { status: 500, .. })));
    assert_eq!(store.snapshot().shift_stats.total_scanned, 0);
}

/// 履歴取得: limit クエリと件数の切り詰め
#[tokio::test]
async fn test_scan_history_limit() {
    let seen: Seen<String> = Arc::default();
    let app = Router::new()
        .route(
            "/api/scans",
            get(|State(seen): State<Seen<String>>, RawQuery(query): RawQuery| async move {
                seen.lock().unwrap().push(query.unwrap_or_default());
                Json(json!([fake_result(), fake_result(), fake_result()]))
            }),
        )
        .with_state(seen.clone());
    let base_url = serve(app).await;

    let results = client(&base_url).scan_history(2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(*seen.lock().unwrap(), vec!["limit=2".to_string()]);
}

/// レポート送信失敗時は submitted にならず入力が残る。再送信で成功する
#[tokio::test]
async fn test_report_retry_keeps_inputs() {
    let seen: Seen<Value> = Arc::default();
    let app = Router::new()
        .route(
            "/api/reports",
            post(|State(seen): State<Seen<Value>>, Json(body): Json<Value>| async move {
                let mut seen = seen.lock().unwrap();
                seen.push(body);
                if seen.len() == 1 {
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"detail": "busy"})))
                } else {
                    (StatusCode::OK, Json(json!({"ok": true})))
                }
            }),
        )
        .with_state(seen.clone());
    let api = client(&serve(app).await);

    let mut store = AppStore::new(Worker { name: "Operator 014".into(), shift_id: "SHIFT-N".into() });
    store.add_scan_result(ic_inspect_common::demo::demo_result(true, "STATION-001"));

    let mut submitter = ReportSubmitter::new(ReportForm {
        anomalies_note: "Tray 3 smudged".into(),
        jig_condition: JigCondition::NeedsCleaning,
    });

    let err = submitter.submit(&api, &store.snapshot()).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 503, .. }));
    assert!(!submitter.is_submitted());
    assert!(!submitter.is_submitting());
    assert_eq!(submitter.form.anomalies_note, "Tray 3 smudged");
    assert_eq!(submitter.form.jig_condition, JigCondition::NeedsCleaning);

    submitter.submit(&api, &store.snapshot()).await.unwrap();
    assert!(submitter.is_submitted());

    let reports = seen.lock().unwrap();
    assert_eq!(reports.len(), 2);
    let report = &reports[1];
    assert_eq!(report["operatorName"], "Operator 014");
    assert_eq!(report["shiftId"], "SHIFT-N");
    assert_eq!(report["totalScanned"], 1);
    assert_eq!(report["passCount"], 1);
    assert_eq!(report["jigCondition"], "needs-cleaning");
    assert_eq!(report["anomaliesNote"], "Tray 3 smudged");
}

/// 不具合報告の送信内容
#[tokio::test]
async fn test_report_issue_body() {
    let seen: Seen<Value> = Arc::default();
    let app = Router::new()
        .route("/api/issues", post(record_json))
        .with_state(seen.clone());
    let base_url = serve(app).await;

    let state = AppStore::default().snapshot();
    let issue = IssueReport::new(&state, IssueCategory::Hardware, "Ring light flickers");
    client(&base_url).report_issue(&issue).await.unwrap();

    let issues = seen.lock().unwrap();
    assert_eq!(issues[0]["category"], "hardware");
    assert_eq!(issues[0]["description"], "Ring light flickers");
    assert!(issues[0].get("inspectionId").is_none());
}

/// ライブ映像: MJPEG なら利用可、それ以外は利用不可
#[tokio::test]
async fn test_probe_stream() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/api/video/stream",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => (
                        StatusCode::OK,
                        [(header::CONTENT_TYPE, "multipart/x-mixed-replace; boundary=frame")],
                        String::new(),
                    ),
                    1 => (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")], "<html></html>".into()),
                    _ => (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "application/json")], "{}".into()),
                }
            }),
        )
        .with_state(calls);
    let api = client(&serve(app).await);

    match api.probe_stream().await {
        StreamStatus::Available { url, content_type } => {
            assert!(url.ends_with("/api/video/stream"));
            assert!(content_type.starts_with("multipart/x-mixed-replace"));
        }
        other => panic!("expected available, got {other:?}"),
    }
    assert!(matches!(api.probe_stream().await, StreamStatus::Unavailable(_)));
    assert!(matches!(api.probe_stream().await, StreamStatus::Unavailable(_)));
}

/// 撮影トリガー: 応答JSONをそのまま返す
#[tokio::test]
async fn test_trigger_scan() {
    let app = Router::new().route(
        "/api/scan/trigger",
        post(|| async { Json(json!({"status": "captured"})) }),
    );
    let response = client(&serve(app).await).trigger_scan().await.unwrap();
    assert_eq!(response["status"], "captured");
}
