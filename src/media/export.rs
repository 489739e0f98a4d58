/// Multi-resolution poster export
///
/// A final poster is resampled so its longest side matches the chosen
/// quality tier, then written out as a PNG.
use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use super::codec::CodecError;
use crate::state::data::GeneratedImage;

/// Export tiers (longest side in pixels)
const TIER_NORMAL: u32 = 1024; // Web
const TIER_HIGH: u32 = 3072; // Print
const TIER_ULTRA: u32 = 5120; // Professional

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Image has no pixels to export")]
    EmptyImage,
    #[error("Failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Export task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportQuality {
    Normal,
    High,
    Ultra,
}

impl ExportQuality {
    pub const ALL: [ExportQuality; 3] = [ExportQuality::Normal, ExportQuality::High, ExportQuality::Ultra];

    /// Target length of the longest side
    pub fn longest_side(self) -> u32 {
        match self {
            ExportQuality::Normal => TIER_NORMAL,
            ExportQuality::High => TIER_HIGH,
            ExportQuality::Ultra => TIER_ULTRA,
        }
    }

    /// Tier name used in file names
    pub fn as_str(self) -> &'static str {
        match self {
            ExportQuality::Normal => "normal",
            ExportQuality::High => "high",
            ExportQuality::Ultra => "ultra",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportQuality::Normal => "Normal",
            ExportQuality::High => "High Resolution",
            ExportQuality::Ultra => "Ultra High Resolution",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ExportQuality::Normal => "Good for web",
            ExportQuality::High => "Good for print",
            ExportQuality::Ultra => "Professional quality",
        }
    }
}

impl std::fmt::Display for ExportQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Scale natural dimensions so the longer side equals the tier's target
///
/// Width wins ties. Returns None for a zero-sized input.
pub fn target_dimensions(natural_width: u32, natural_height: u32, quality: ExportQuality) -> Option<Dimensions> {
    if natural_width == 0 || natural_height == 0 {
        return None;
    }

    let target = quality.longest_side();
    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (f64::from(short) * f64::from(target) / f64::from(long)).round() as u32;
        scaled.max(1)
    };

    let dims = if natural_width >= natural_height {
        Dimensions {
            width: target,
            height: scale(natural_height, natural_width),
        }
    } else {
        Dimensions {
            width: scale(natural_width, natural_height),
            height: target,
        }
    };
    Some(dims)
}

/// Download file name for a poster at a tier
pub fn file_name(id: &str, quality: ExportQuality) -> String {
    format!("poster-{}-{}.png", id, quality)
}

/// Resample a generated image to the tier's size and encode it as PNG
pub fn render_png(image: &GeneratedImage, quality: ExportQuality) -> Result<(Vec<u8>, Dimensions), ExportError> {
    let bytes = image.decode()?;
    let source = image::load_from_memory(&bytes).map_err(CodecError::from)?;

    let dims = target_dimensions(source.width(), source.height(), quality)
        .ok_or(ExportError::EmptyImage)?;

    let resized = source.resize_exact(dims.width, dims.height, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(ExportError::Encode)?;

    Ok((out.into_inner(), dims))
}

/// Render a poster and write it into `dir`
///
/// Returns the path of the written file.
pub async fn export_to_dir(
    image: GeneratedImage,
    quality: ExportQuality,
    dir: PathBuf,
) -> Result<PathBuf, ExportError> {
    // Resampling to 5120px is CPU-heavy; keep it off the async workers
    tokio::task::spawn_blocking(move || export_blocking(&image, quality, &dir))
        .await
        .map_err(|e| ExportError::Join(e.to_string()))?
}

fn export_blocking(image: &GeneratedImage, quality: ExportQuality, dir: &std::path::Path) -> Result<PathBuf, ExportError> {
    let (png, dims) = render_png(image, quality)?;

    std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file_name(&image.id, quality));
    std::fs::write(&path, &png).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    info!(
        id = %image.id,
        quality = %quality,
        width = dims.width,
        height = dims.height,
        path = %path.display(),
        "Exported poster"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::codec::tests::png_bytes;
    use crate::media::codec::{probe_dimensions, InlineImage};

    fn poster(width: u32, height: u32) -> GeneratedImage {
        GeneratedImage {
            id: "poster-1-0".to_string(),
            src: InlineImage::from_bytes("image/png", &png_bytes(width, height)).to_data_uri(),
            prompt: "neon city".to_string(),
        }
    }

    #[test]
    fn test_landscape_high() {
        let dims = target_dimensions(3000, 2000, ExportQuality::High).unwrap();
        assert_eq!(dims, Dimensions { width: 3072, height: 2048 });
    }

    #[test]
    fn test_portrait_normal() {
        let dims = target_dimensions(2000, 3000, ExportQuality::Normal).unwrap();
        assert_eq!(dims, Dimensions { width: 683, height: 1024 });
    }

    #[test]
    fn test_square_and_ultra() {
        let dims = target_dimensions(800, 800, ExportQuality::Ultra).unwrap();
        assert_eq!(dims, Dimensions { width: 5120, height: 5120 });
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(target_dimensions(0, 100, ExportQuality::Normal), None);
        assert_eq!(target_dimensions(100, 0, ExportQuality::Normal), None);

        // Extreme strips keep at least one pixel on the short side
        let dims = target_dimensions(100_000, 1, ExportQuality::Normal).unwrap();
        assert_eq!(dims, Dimensions { width: 1024, height: 1 });
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("refine-17-3", ExportQuality::Ultra), "poster-refine-17-3-ultra.png");
    }

    #[test]
    fn test_render_png_matches_target() {
        let (png, dims) = render_png(&poster(30, 20), ExportQuality::Normal).unwrap();
        assert_eq!(dims, Dimensions { width: 1024, height: 683 });
        assert_eq!(probe_dimensions(&png).unwrap(), (1024, 683));
    }

    #[test]
    fn test_render_png_rejects_bad_source() {
        let broken = GeneratedImage {
            id: "x".to_string(),
            src: "not a data uri".to_string(),
            prompt: String::new(),
        };
        assert!(matches!(
            render_png(&broken, ExportQuality::Normal),
            Err(ExportError::Codec(CodecError::MalformedDataUri))
        ));
    }

    #[tokio::test]
    async fn test_export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");

        let path = export_to_dir(poster(20, 40), ExportQuality::Normal, target.clone())
            .await
            .unwrap();

        assert_eq!(path, target.join("poster-poster-1-0-normal.png"));
        let written = std::fs::read(&path).unwrap();
        assert_eq!(probe_dimensions(&written).unwrap(), (512, 1024));
    }
}
