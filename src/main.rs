use clap::Parser;
use ic_inspect::{batch, capture, cli, config, error, logging, session};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use ic_inspect_common::history::{paginate, search_in, PAGE_SIZE};
use ic_inspect_common::render::HistoryRow;
use ic_inspect_common::{
    ApiClient, AppStore, DemoSource, IssueReport, ResultSource, ResultView, ScanResult,
    ScanTimings, StreamStatus,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let mut config = Config::load()?;

    let base_url = cli.base_url.clone().unwrap_or_else(|| config.base_url());
    let connect = || ApiClient::new(&base_url, config.timeout());

    match cli.command {
        Commands::Scan { path, demo, json, recursive } => {
            let targets = capture::collect_targets(&path, recursive)?;
            let source: Arc<dyn ResultSource> = if demo || config.demo_mode {
                Arc::new(DemoSource::new(config.station_id.clone()))
            } else {
                Arc::new(connect()?)
            };

            if !json {
                println!("🔍 ic-inspect - 検査 ({}枚)\n", targets.len());
            }

            let mut store = AppStore::new(config.worker());
            let outcome =
                batch::scan_targets(&targets, &mut store, source, ScanTimings::default(), json)
                    .await?;

            if json {
                if let Some(output) = outcome.to_json(path.is_dir())? {
                    println!("{}", output);
                }
            } else if path.is_dir() {
                let stats = store.snapshot().shift_stats;
                println!(
                    "✅ 検査完了: {}件 (合格 {} / 不合格 {} / 偽造品 {} / 要確認 {}) 合格率 {}%",
                    stats.total_scanned,
                    stats.pass_count,
                    stats.fail_count,
                    stats.fakes_found,
                    stats.review_needed,
                    stats.pass_rate_percent()
                );
            }

            outcome.ensure_all_passed()?;
        }

        Commands::Trigger => {
            println!("📸 ステーションで撮影中...");
            let response = connect()?.trigger_scan().await?;

            // 検査結果の形なら整形して表示
            match serde_json::from_value::<ScanResult>(response.clone()) {
                Ok(result) if result.overall_status.is_some() || result.is_genuine.is_some() => {
                    println!("{}", ResultView::from(&result));
                }
                _ => println!("{}", serde_json::to_string_pretty(&response)?),
            }
        }

        Commands::History { limit, search, page } => {
            let results = connect()?.scan_history(limit).await?;
            let matched = search_in(&results, search.as_deref().unwrap_or(""));
            let page = paginate(matched, page, PAGE_SIZE);

            println!("📋 検査履歴 (ページ {}/{})", page.page, page.total_pages);
            if page.items.is_empty() {
                println!("履歴はありません");
            }
            for row in page.items.into_iter().map(HistoryRow::from) {
                session::print_row(&row);
            }
        }

        Commands::Issue { category, description, inspection_id } => {
            let state = AppStore::new(config.worker()).snapshot();
            let mut issue = IssueReport::new(&state, category, description);
            issue.inspection_id = inspection_id;

            connect()?.report_issue(&issue).await?;
            println!("✔ 不具合を報告しました");
        }

        Commands::Stream => {
            let client = connect()?;
            match client.probe_stream().await {
                StreamStatus::Available { url, content_type } => {
                    println!("✔ ライブ映像: {} ({})", url, content_type);
                }
                StreamStatus::Unavailable(reason) => {
                    println!("✘ ライブ映像は利用できません: {}", reason);
                }
            }
        }

        Commands::Session { demo } => {
            let demo = demo || config.demo_mode;
            let (source, client): (Arc<dyn ResultSource>, Option<ApiClient>) = if demo {
                (Arc::new(DemoSource::new(config.station_id.clone())), None)
            } else {
                let client = connect()?;
                (Arc::new(client.clone()), Some(client))
            };

            let mut session = session::Session::new(&config, source, client);
            session.run().await?;
        }

        Commands::Config { show, set_base_url, set_operator, set_shift, set_theme, set_demo } => {
            let mut changed = false;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                changed = true;
            }
            if let Some(name) = set_operator {
                config.operator_name = name;
                changed = true;
            }
            if let Some(shift) = set_shift {
                config.shift_id = shift;
                changed = true;
            }
            if let Some(theme) = set_theme {
                config.theme = theme;
                changed = true;
            }
            if let Some(demo) = set_demo {
                config.demo_mode = demo;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("{}", serde_json::to_string_pretty(&config)?);
                println!("(実際の接続先: {})", base_url);
            }
        }
    }

    Ok(())
}
