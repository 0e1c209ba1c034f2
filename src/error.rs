use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("検査に失敗しました: {failed}/{total}件")]
    ScanFailed { failed: usize, total: usize },

    #[error("バックエンドエラー: {0}")]
    Backend(ic_inspect_common::Error),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ic_inspect_common::Error> for InspectError {
    fn from(err: ic_inspect_common::Error) -> Self {
        use ic_inspect_common::Error as Common;
        match err {
            Common::Config(msg) => InspectError::Config(msg),
            Common::Io(e) => InspectError::Io(e),
            Common::Json(e) => InspectError::JsonParse(e),
            other => InspectError::Backend(other),
        }
    }
}

impl From<dialoguer::Error> for InspectError {
    fn from(err: dialoguer::Error) -> Self {
        InspectError::Prompt(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;
