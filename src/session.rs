//! 対話式の検査セッション
//!
//! 1つのストアとフローを保持し、入力されたコマンドをキー操作や
//! レポート送信に振り分ける。

use crate::capture;
use crate::config::Config;
use crate::error::{InspectError, Result};
use dialoguer::{Input, Select};
use ic_inspect_common::history::PAGE_SIZE;
use ic_inspect_common::render::HistoryRow;
use ic_inspect_common::schedule::{Applied, PhaseEvent};
use ic_inspect_common::{
    ApiClient, AppStore, InspectionFlow, IssueCategory, IssueReport, JigCondition, Key,
    KeyOutcome, ReportForm, ReportSubmitter, ResultSource, ResultView, ScanResult,
    ScanTimings, ScheduledScan,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// セッション中のコマンド
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// キー操作（スペース・Enter）
    Key(Key),
    /// 画像を開く
    Open(PathBuf),
    /// 画像の選択を解除
    Clear,
    /// 履歴を表示（絞り込み文字列つき）
    History(String),
    /// シフト統計を表示
    Stats,
    /// シフト終了レポートを送信
    Report,
    /// 不具合を報告
    Issue,
    /// テーマを切り替え
    Theme,
    Help,
    Quit,
    Unknown(String),
}

/// 入力行をコマンドに変換
pub fn parse_action(input: &str) -> SessionAction {
    let trimmed = input.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head {
        // 空入力はEnterキー扱い
        "" | "n" | "next" => SessionAction::Key(Key::Enter),
        "s" | "scan" => SessionAction::Key(Key::Space),
        "o" | "open" if !rest.is_empty() => SessionAction::Open(PathBuf::from(rest)),
        "o" | "open" => SessionAction::Key(Key::Space),
        "c" | "clear" => SessionAction::Clear,
        "h" | "history" => SessionAction::History(rest.to_string()),
        "st" | "stats" => SessionAction::Stats,
        "r" | "report" => SessionAction::Report,
        "i" | "issue" => SessionAction::Issue,
        "t" | "theme" => SessionAction::Theme,
        "?" | "help" => SessionAction::Help,
        "q" | "quit" | "exit" => SessionAction::Quit,
        _ => SessionAction::Unknown(trimmed.to_string()),
    }
}

const HELP: &str = "\
操作:
  s / [スペース相当]  画像未選択なら画像を開く、選択済みなら検査開始
  [Enter] / n         結果表示中なら次の検査へ
  o <パス>            画像を開く
  c                   画像の選択を解除
  h [検索語]          履歴を表示
  st                  シフト統計
  r                   シフト終了レポートを送信
  i                   不具合を報告
  t                   テーマ切り替え
  q                   終了";

/// スキャンを開始し、スピナー表示しながら完了まで進める
pub async fn scan_with_progress(
    flow: &mut InspectionFlow,
    store: &mut AppStore,
    source: Arc<dyn ResultSource>,
    timings: ScanTimings,
) -> Result<Option<ScanResult>> {
    if !flow.start_scan(store) {
        return Ok(None);
    }
    follow_scan(flow, store, source, timings).await
}

/// 開始済みのスキャンを完了まで進める
pub async fn follow_scan(
    flow: &mut InspectionFlow,
    store: &mut AppStore,
    source: Arc<dyn ResultSource>,
    timings: ScanTimings,
) -> Result<Option<ScanResult>> {
    let Some(image) = flow.selected_image().cloned() else {
        return Ok(None);
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("📸 撮影中... {}", image.name()));

    let mut scan = ScheduledScan::spawn(&Handle::current(), timings, source, image);
    while let Some(event) = scan.next().await {
        if matches!(event, PhaseEvent::FlashElapsed) {
            spinner.set_message("解析中...");
        }
        match ScheduledScan::apply(event, flow, store) {
            Applied::Pending => continue,
            Applied::Done => {
                spinner.finish_and_clear();
                return Ok(flow.result().cloned());
            }
            Applied::Failed(err) => {
                spinner.finish_and_clear();
                return Err(err.into());
            }
        }
    }

    spinner.finish_and_clear();
    flow.abort_scan(store);
    Err(ic_inspect_common::Error::Cancelled.into())
}

pub struct Session {
    store: AppStore,
    flow: InspectionFlow,
    source: Arc<dyn ResultSource>,
    client: Option<ApiClient>,
    submitter: ReportSubmitter,
    timings: ScanTimings,
}

impl Session {
    /// `client` が None ならデモ結果で検査し、送信系は使えない
    pub fn new(config: &Config, source: Arc<dyn ResultSource>, client: Option<ApiClient>) -> Self {
        let mut store = AppStore::new(config.worker());
        store.set_theme(config.theme);
        Self {
            store,
            flow: InspectionFlow::new(),
            source,
            client,
            submitter: ReportSubmitter::default(),
            timings: ScanTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: ScanTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn flow(&self) -> &InspectionFlow {
        &self.flow
    }

    /// 対話ループ
    pub async fn run(&mut self) -> Result<()> {
        let worker = self.store.snapshot().worker.clone();
        println!("🔍 ic-inspect - 検査セッション");
        println!("作業者: {} / シフト: {}", worker.name, worker.shift_id);
        if self.client.is_none() {
            println!("⚠ デモモード（バックエンドに接続しません）");
        }
        println!("---\n{}\n---", HELP);

        loop {
            let prompt = format!("[{}]", self.flow.state().name());
            let input: String = Input::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?;

            let action = parse_action(&input);
            match self.dispatch(action).await {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => println!("✘ {}", e),
            }
        }

        let stats = self.store.snapshot().shift_stats;
        println!(
            "\n✅ セッション終了: {}件検査 (合格率 {}%)",
            stats.total_scanned,
            stats.pass_rate_percent()
        );
        Ok(())
    }

    /// コマンドを1つ実行（終了なら false）
    pub async fn dispatch(&mut self, action: SessionAction) -> Result<bool> {
        match action {
            SessionAction::Key(key) => self.press(key).await?,
            SessionAction::Open(path) => self.open(path)?,
            SessionAction::Clear => {
                if self.flow.clear_image(&mut self.store) {
                    println!("→ 画像の選択を解除");
                }
            }
            SessionAction::History(query) => self.print_history(&query),
            SessionAction::Stats => self.print_stats(),
            SessionAction::Report => self.submit_report().await?,
            SessionAction::Issue => self.report_issue().await?,
            SessionAction::Theme => {
                let theme = self.store.snapshot().theme.toggled();
                self.store.set_theme(theme);
                println!("→ テーマ: {}", theme);
            }
            SessionAction::Help => println!("{}", HELP),
            SessionAction::Quit => return Ok(false),
            SessionAction::Unknown(input) => {
                println!("⚠ 不明なコマンド: {} (? でヘルプ)", input);
            }
        }
        Ok(true)
    }

    async fn press(&mut self, key: Key) -> Result<()> {
        match self.flow.handle_key(&mut self.store, key) {
            KeyOutcome::SelectImage => {
                let path: String = Input::new().with_prompt("画像のパス").interact_text()?;
                self.open(PathBuf::from(path.trim()))?;
            }
            KeyOutcome::ScanStarted => {
                let result = follow_scan(
                    &mut self.flow,
                    &mut self.store,
                    self.source.clone(),
                    self.timings,
                )
                .await?;
                print_result(result.as_ref());
            }
            KeyOutcome::NextScan => println!("→ 次の検査へ（同じ画像で再検査できます）"),
            KeyOutcome::Ignored => {}
        }
        Ok(())
    }

    fn open(&mut self, path: PathBuf) -> Result<()> {
        let captured = capture::load_image(&path)?;
        if self.flow.select_image(&mut self.store, captured.image) {
            println!(
                "✔ 画像を選択: {} ({}x{})",
                captured.path.display(),
                captured.width,
                captured.height
            );
        }
        Ok(())
    }

    fn print_history(&self, query: &str) {
        let state = self.store.snapshot();
        let page = state.scan_history.page(query, 1, PAGE_SIZE);
        if page.items.is_empty() {
            println!("履歴はありません");
            return;
        }
        for row in page.items.into_iter().map(HistoryRow::from) {
            print_row(&row);
        }
    }

    fn print_stats(&self) {
        let state = self.store.snapshot();
        let stats = state.shift_stats;
        println!("📊 シフト統計 ({})", state.worker.shift_id);
        println!("  検査数:     {}", stats.total_scanned);
        println!("  合格:       {}", stats.pass_count);
        println!("  不合格:     {}", stats.fail_count);
        println!("  偽造品:     {}", stats.fakes_found);
        println!("  要確認:     {}", stats.review_needed);
        println!("  合格率:     {}%", stats.pass_rate_percent());
    }

    fn require_client(&self) -> Result<&ApiClient> {
        self.client
            .as_ref()
            .ok_or_else(|| InspectError::Config("デモモードでは送信できません".into()))
    }

    async fn submit_report(&mut self) -> Result<()> {
        let client = self.require_client()?.clone();

        if self.submitter.is_submitted() {
            self.submitter.start_over();
        }

        // 前回失敗時の入力を初期値として残す
        let form = &self.submitter.form;
        let note: String = Input::new()
            .with_prompt("所見メモ")
            .with_initial_text(form.anomalies_note.clone())
            .allow_empty(true)
            .interact_text()?;

        let labels: Vec<&str> = JigCondition::ALL.iter().map(|j| j.label()).collect();
        let current = JigCondition::ALL
            .iter()
            .position(|j| *j == form.jig_condition)
            .unwrap_or(0);
        let choice = Select::new()
            .with_prompt("治具の状態")
            .items(&labels)
            .default(current)
            .interact()?;

        self.submitter.form = ReportForm {
            anomalies_note: note,
            jig_condition: JigCondition::ALL[choice],
        };

        let state = self.store.snapshot();
        match self.submitter.submit(&client, &state).await {
            Ok(_) => {
                println!("✔ シフトレポートを送信しました");
                Ok(())
            }
            Err(e) => {
                println!("入力内容は保持されています。r で再送信できます");
                Err(e.into())
            }
        }
    }

    async fn report_issue(&mut self) -> Result<()> {
        let client = self.require_client()?.clone();

        let labels: Vec<&str> = IssueCategory::ALL.iter().map(|c| c.label()).collect();
        let choice = Select::new()
            .with_prompt("区分")
            .items(&labels)
            .default(0)
            .interact()?;
        let description: String = Input::new().with_prompt("内容").interact_text()?;

        let issue = IssueReport::new(&self.store.snapshot(), IssueCategory::ALL[choice], description);
        client.report_issue(&issue).await?;
        println!("✔ 不具合を報告しました");
        Ok(())
    }
}

fn print_result(result: Option<&ScanResult>) {
    if let Some(result) = result {
        println!("{}", ResultView::from(result));
    }
}

pub fn print_row(row: &HistoryRow) {
    println!(
        "  {:<8} {:<20} {:<16} {:<19} {}",
        row.status.as_str(),
        row.inspection_id,
        row.part_number,
        row.timestamp,
        row.reason
    );
}
