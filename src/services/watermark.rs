//! Tiled-logo watermark compositor.

use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage, imageops};

use crate::error::{AppError, AppResult};

/// JPEG quality of watermarked previews.
pub const PREVIEW_JPEG_QUALITY: u8 = 75;

/// A decoded logo, ready to be tiled over any number of images.
#[derive(Clone)]
pub struct Watermark {
    logo: Arc<RgbaImage>,
}

impl Watermark {
    pub fn from_bytes(logo: &[u8]) -> AppResult<Self> {
        let logo = image::load_from_memory(logo)?.to_rgba8();
        if logo.width() == 0 || logo.height() == 0 {
            return Err(AppError::Image("watermark logo is empty".to_string()));
        }
        Ok(Self {
            logo: Arc::new(logo),
        })
    }

    /// Tile the logo from the top-left corner and re-encode as JPEG.
    pub fn apply(&self, image: &[u8]) -> AppResult<Vec<u8>> {
        let mut base = image::load_from_memory(image)?.to_rgba8();
        let (width, height) = base.dimensions();
        let (tile_w, tile_h) = self.logo.dimensions();

        for y in (0..height).step_by(tile_h as usize) {
            for x in (0..width).step_by(tile_w as usize) {
                imageops::overlay(&mut base, self.logo.as_ref(), x as i64, y as i64);
            }
        }

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgba8(base).to_rgb8();
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, PREVIEW_JPEG_QUALITY);
        rgb.write_with_encoder(encoder)?;
        Ok(out)
    }

    /// [`Watermark::apply`] on the blocking pool.
    pub async fn apply_async(&self, image: Vec<u8>) -> AppResult<Vec<u8>> {
        let watermark = self.clone();
        tokio::task::spawn_blocking(move || watermark.apply(&image))
            .await
            .map_err(|e| AppError::Internal(format!("watermark task failed: {}", e)))?
    }
}

/// Composite `logo` over `image`. Pure; no I/O.
pub fn apply_watermark(image: &[u8], logo: &[u8]) -> AppResult<Vec<u8>> {
    Watermark::from_bytes(logo)?.apply(image)
}
