//! Raster page resampling.

use std::io::Cursor;

use image::DynamicImage;
use image::imageops::FilterType;
use umlpage_engine::ImageFormat;

use crate::error::RenderError;

/// Resample a raster page to `width` pixels, keeping its aspect ratio.
///
/// Vector pages and a zero width pass through unchanged. Resampled pages are
/// re-encoded as opaque RGB PNG.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if the page cannot be decoded or re-encoded.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn fit_width(bytes: Vec<u8>, format: ImageFormat, width: u32) -> Result<Vec<u8>, RenderError> {
    if !format.is_raster() || width == 0 {
        return Ok(bytes);
    }

    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .map_err(|e| RenderError::io("decode page image", e))?;
    if img.width() == width {
        return Ok(bytes);
    }

    let ratio = f64::from(width) / f64::from(img.width());
    let height = ((f64::from(img.height()) * ratio) as u32).max(1);
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut output = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| RenderError::io("encode page image", e))?;

    tracing::trace!(
        from_width = img.width(),
        from_height = img.height(),
        width,
        height,
        "resampled page"
    );
    Ok(output)
}
