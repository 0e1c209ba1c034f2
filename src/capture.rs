//! 撮影画像の読み込み
//!
//! ファイル1枚、またはフォルダ直下の画像をまとめて検査対象にする。

use crate::error::{InspectError, Result};
use ic_inspect_common::ImageRef;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// 読み込み済みの撮影画像
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub image: ImageRef,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    pub fn file_name(&self) -> &str {
        self.image.name()
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// 画像ファイルを読み込む（デコードできない場合はエラー）
pub fn load_image(path: &Path) -> Result<CapturedImage> {
    if !path.is_file() {
        return Err(InspectError::FileNotFound(path.display().to_string()));
    }

    let data = std::fs::read(path)?;
    image::guess_format(&data)
        .map_err(|e| InspectError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| InspectError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "capture.jpg".to_string());

    tracing::debug!(path = %path.display(), width, height, "image loaded");

    Ok(CapturedImage {
        path: path.to_path_buf(),
        image: ImageRef::bytes(name, data),
        width,
        height,
    })
}

/// フォルダ内の画像パスをファイル名順に列挙
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(InspectError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_path(e.path()))
        .map(|e| e.into_path())
        .collect();

    images.sort();
    Ok(images)
}

/// ファイルならそのまま、フォルダなら中の画像を対象にする
pub fn collect_targets(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let images = scan_folder(path, recursive)?;
        if images.is_empty() {
            return Err(InspectError::NoImagesFound(path.display().to_string()));
        }
        Ok(images)
    } else if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        Err(InspectError::FileNotFound(path.display().to_string()))
    }
}
