use image::imageops::{self, FilterType};
use image::{Luma, RgbImage};
use qrcode::{EcLevel, QrCode, Version};

use crate::config::PosterStyle;
use crate::foundation::error::{PosterError, PosterResult};

/// Encode `url` as a borderless QR glyph scaled to `qr_size_px` square.
///
/// The configured version is tried first; data that does not fit grows to the smallest version
/// that holds it.
pub(crate) fn render_qr(url: &str, style: &PosterStyle) -> PosterResult<RgbImage> {
    let code = match QrCode::with_version(url, Version::Normal(style.qr_version), EcLevel::L) {
        Ok(code) => code,
        Err(_) => {
            let code = QrCode::with_error_correction_level(url, EcLevel::L)
                .map_err(|e| PosterError::render(format!("qr encode failed: {e}")))?;
            tracing::debug!(
                requested = style.qr_version,
                width = code.width(),
                "qr data exceeds requested version"
            );
            code
        }
    };

    let glyph = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(style.qr_module_px, style.qr_module_px)
        .dark_color(Luma([0]))
        .light_color(Luma([255]))
        .build();

    let resized = imageops::resize(&glyph, style.qr_size_px, style.qr_size_px, FilterType::Lanczos3);
    Ok(image::DynamicImage::ImageLuma8(resized).to_rgb8())
}
