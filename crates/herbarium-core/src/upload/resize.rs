//! Decode, shrink to a maximum width, re-encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use super::UploadError;

/// Target size for an image `width`×`height` capped at `max_width`, keeping
/// the aspect ratio. Narrower images keep their size.
pub fn fit_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let h = (u64::from(height) * u64::from(max_width) / u64::from(width)).max(1);
    (max_width, h as u32)
}

/// Returns the re-encoded JPEG bytes and the final dimensions.
pub fn resize_to_jpeg(
    data: &[u8],
    max_width: u32,
    quality: u8,
) -> Result<(Vec<u8>, u32, u32), UploadError> {
    let img = image::load_from_memory(data).map_err(|e| UploadError::Decode(e.to_string()))?;
    let (w, h) = img.dimensions();
    let (tw, th) = fit_width(w, h, max_width);
    let img: DynamicImage = if (tw, th) == (w, h) {
        img
    } else {
        img.resize_exact(tw, th, FilterType::Lanczos3)
    };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|e| UploadError::Decode(e.to_string()))?;
    Ok((out, tw, th))
}
