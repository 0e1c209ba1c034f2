use clap::{Parser, Subcommand};
use ic_inspect_common::client::DEFAULT_HISTORY_LIMIT;
use ic_inspect_common::{IssueCategory, Theme};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ic-inspect")]
#[command(about = "IC偽造品検査ステーション オペレーター用ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像（またはフォルダ内の画像）を検査
    Scan {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// バックエンドを使わずデモ結果で検査
        #[arg(long)]
        demo: bool,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// ステーションのカメラで撮影・検査を実行
    Trigger,

    /// バックエンドの検査履歴を表示
    History {
        /// 取得件数
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// 型番・検査IDで絞り込み
        #[arg(short, long)]
        search: Option<String>,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// 不具合を報告
    Issue {
        /// 区分 (wrong-verdict/hardware/software/other)
        #[arg(short, long, default_value = "other")]
        category: IssueCategory,

        /// 内容
        #[arg(required = true)]
        description: String,

        /// 対象の検査ID
        #[arg(long)]
        inspection_id: Option<String>,
    },

    /// ライブ映像の状態を確認
    Stream,

    /// 対話式の検査セッションを開始
    Session {
        /// バックエンドを使わずデモ結果で検査
        #[arg(long)]
        demo: bool,
    },

    /// 設定を表示・変更
    Config {
        /// 現在の設定を表示
        #[arg(long)]
        show: bool,

        /// バックエンドURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 作業者名を設定
        #[arg(long)]
        set_operator: Option<String>,

        /// シフトIDを設定
        #[arg(long)]
        set_shift: Option<String>,

        /// テーマを設定 (light/dark)
        #[arg(long)]
        set_theme: Option<Theme>,

        /// デモモードの有効/無効
        #[arg(long)]
        set_demo: Option<bool>,
    },
}
