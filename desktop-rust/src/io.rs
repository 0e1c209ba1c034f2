use anyhow::{Context, Result};
use ic_inspect_common::{ImageRef, StationConfig};
use std::fs;
use std::path::Path;

use crate::model::DecodedImage;

/// Station settings shared with the CLI (`~/.config/ic-inspect/config.json`).
pub fn load_settings() -> Result<StationConfig> {
    StationConfig::load().context("load station config")
}

pub fn load_settings_from(path: &Path) -> Result<StationConfig> {
    StationConfig::load_from(path).with_context(|| format!("parse {}", path.display()))
}

pub fn read_image_file(path: &Path) -> Result<ImageRef> {
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    image::guess_format(&data).with_context(|| format!("not an image: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("capture.jpg")
        .to_string();
    Ok(ImageRef::bytes(name, data))
}

/// Decodes to RGBA, shrinking anything larger than `max_side` on either axis.
pub fn decode_image(bytes: &[u8], max_side: u32) -> Result<DecodedImage> {
    let image = image::load_from_memory(bytes).context("decode image")?;
    let image = if image.width() > max_side || image.height() > max_side {
        image.thumbnail(max_side, max_side)
    } else {
        image
    };
    Ok(DecodedImage {
        size: [image.width() as usize, image.height() as usize],
        pixels: image.to_rgba8().into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ic_inspect_common::Theme;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn settings_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"operator_name": "Operator 007", "theme": "light"}"#).unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.operator_name, "Operator 007");
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.shift_id, "SHIFT-2025-001");
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn broken_settings_report_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_settings_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.json"));
    }

    #[test]
    fn decode_shrinks_large_images() {
        let mut bytes = Vec::new();
        image::RgbImage::new(400, 100)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes, 200).unwrap();
        assert_eq!(decoded.size, [200, 50]);
        assert_eq!(decoded.pixels.len(), 200 * 50 * 4);
    }

    #[test]
    fn read_image_file_rejects_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        fs::write(&path, b"hello").unwrap();
        assert!(read_image_file(&path).is_err());
    }
}
