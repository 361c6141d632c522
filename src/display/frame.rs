use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::foundation::error::{PosterError, PosterResult};

/// Screen-sized opaque raster of the current poster, black-padded around the fitted image.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayFrame {
    pixels: RgbImage,
}

impl DisplayFrame {
    /// Scale `img` to the largest size that fits `screen_w x screen_h` with its aspect preserved,
    /// and center it on black.
    pub fn fit(img: &RgbImage, screen_w: u32, screen_h: u32) -> PosterResult<Self> {
        if screen_w == 0 || screen_h == 0 {
            return Err(PosterError::display("screen size must be non-zero"));
        }
        let (iw, ih) = img.dimensions();
        if iw == 0 || ih == 0 {
            return Err(PosterError::decode("poster image is empty"));
        }

        let (new_w, new_h) = fitted_size(iw, ih, screen_w, screen_h);
        let scaled = imageops::resize(img, new_w, new_h, FilterType::Lanczos3);

        let mut pixels = RgbImage::new(screen_w, screen_h);
        let x = (screen_w - new_w) / 2;
        let y = (screen_h - new_h) / 2;
        imageops::replace(&mut pixels, &scaled, i64::from(x), i64::from(y));
        Ok(Self { pixels })
    }

    /// Wrap an already screen-sized raster.
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    /// Pack as `0x00RRGGBB` words, row-major.
    pub fn to_xrgb(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity((self.width() * self.height()) as usize);
        self.write_xrgb(&mut out);
        out
    }

    pub fn write_xrgb(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(
            self.pixels
                .pixels()
                .map(|p| (u32::from(p.0[0]) << 16) | (u32::from(p.0[1]) << 8) | u32::from(p.0[2])),
        );
    }
}

/// Largest `(w, h)` with the source aspect that fits inside the screen, at least 1x1.
pub fn fitted_size(iw: u32, ih: u32, screen_w: u32, screen_h: u32) -> (u32, u32) {
    let (iw64, ih64) = (u64::from(iw), u64::from(ih));
    let (sw64, sh64) = (u64::from(screen_w), u64::from(screen_h));
    let (w, h) = if iw64 * sh64 <= ih64 * sw64 {
        (iw64 * sh64 / ih64, sh64)
    } else {
        (sw64, ih64 * sw64 / iw64)
    };
    (
        (w as u32).clamp(1, screen_w),
        (h as u32).clamp(1, screen_h),
    )
}
