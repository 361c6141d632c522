use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::config::{AspectRatio, PosterStyle};
use crate::foundation::color::Rgb8;

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn offset(self, dx: u32, dy: u32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Where this rectangle lands after rotating a `canvas_width`-wide image 90° counter-clockwise.
    pub fn rotated_ccw(self, canvas_width: u32) -> Self {
        Self::new(
            self.y,
            canvas_width - self.x - self.width,
            self.height,
            self.width,
        )
    }

    pub fn contains(self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Force-resize the raw poster to the working canvas size.
pub(crate) fn working_canvas(raw: &image::DynamicImage, style: &PosterStyle) -> RgbImage {
    imageops::resize(
        &raw.to_rgb8(),
        style.working_width,
        style.working_height,
        FilterType::Lanczos3,
    )
}

pub(crate) fn fill_rect(img: &mut RgbImage, rect: PixelRect, color: Rgb8) {
    let x_end = (rect.x + rect.width).min(img.width());
    let y_end = (rect.y + rect.height).min(img.height());
    let px = color.to_rgb();
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            img.put_pixel(x, y, px);
        }
    }
}

/// Surround the canvas with a raised bevel lit from the top-left.
///
/// Each strip is exactly `bevel_thickness` pixels wide and lies wholly outside the
/// canvas, so no poster pixel is overpainted. The output grows by `2 * bevel_thickness`
/// on each axis.
pub(crate) fn apply_bevel(canvas: &RgbImage, style: &PosterStyle) -> RgbImage {
    let t = style.bevel_thickness;
    let w = canvas.width() + 2 * t;
    let h = canvas.height() + 2 * t;
    let mut out = RgbImage::from_pixel(w, h, style.bevel_background.to_rgb());
    imageops::replace(&mut out, canvas, i64::from(t), i64::from(t));

    fill_rect(&mut out, PixelRect::new(0, 0, w, t), style.bevel_dark);
    fill_rect(&mut out, PixelRect::new(0, 0, t, h), style.bevel_dark);
    fill_rect(&mut out, PixelRect::new(0, h - t, w, t), style.bevel_light);
    fill_rect(&mut out, PixelRect::new(w - t, 0, t, h), style.bevel_light);
    out
}

/// Center the beveled layer on an off-white mat.
pub(crate) fn apply_passe_partout(beveled: &RgbImage, style: &PosterStyle) -> RgbImage {
    let pad = style.passe_padding;
    let mut out = RgbImage::from_pixel(
        beveled.width() + 2 * pad,
        beveled.height() + 2 * pad,
        style.passe_background.to_rgb(),
    );
    imageops::replace(&mut out, beveled, i64::from(pad), i64::from(pad));
    out
}

/// Smallest `(width, height)` with the given aspect that contains `width x height` without cropping.
pub fn padded_size(width: u32, height: u32, aspect: AspectRatio) -> (u32, u32) {
    let (w, h) = (u64::from(width), u64::from(height));
    let (aw, ah) = (u64::from(aspect.width), u64::from(aspect.height));
    if w * ah < h * aw {
        ((h * aw / ah) as u32, height)
    } else {
        (width, (w * ah / aw) as u32)
    }
}

/// Pillarbox or letterbox `img` onto a background canvas of the target aspect.
///
/// Returns the padded image and the offset at which `img` was placed.
pub(crate) fn pad_to_aspect(
    img: &RgbImage,
    aspect: AspectRatio,
    background: Rgb8,
) -> (RgbImage, (u32, u32)) {
    let (fw, fh) = padded_size(img.width(), img.height(), aspect);
    let mut out = RgbImage::from_pixel(fw, fh, background.to_rgb());
    let x_off = fw.saturating_sub(img.width()) / 2;
    let y_off = fh.saturating_sub(img.height()) / 2;
    imageops::replace(&mut out, img, i64::from(x_off), i64::from(y_off));
    (out, (x_off, y_off))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_style() -> PosterStyle {
        PosterStyle {
            working_width: 20,
            working_height: 30,
            bevel_thickness: 2,
            passe_padding: 4,
            ..Default::default()
        }
    }

    #[test]
    fn bevel_shades_top_left_dark_and_bottom_right_light() {
        let style = small_style();
        let canvas = RgbImage::from_pixel(20, 30, image::Rgb([1, 2, 3]));
        let out = apply_bevel(&canvas, &style);
        assert_eq!(out.dimensions(), (24, 34));
        assert_eq!(out.get_pixel(5, 0).0, [160; 3]);
        assert_eq!(out.get_pixel(0, 5).0, [160; 3]);
        assert_eq!(out.get_pixel(5, 33).0, [230; 3]);
        assert_eq!(out.get_pixel(23, 5).0, [230; 3]);
        assert_eq!(out.get_pixel(2, 2).0, [1, 2, 3]);
        assert_eq!(out.get_pixel(21, 31).0, [1, 2, 3]);
    }

    #[test]
    fn bevel_leaves_every_poster_pixel_untouched() {
        let style = small_style();
        let t = style.bevel_thickness;
        let canvas = RgbImage::from_fn(20, 30, |x, y| image::Rgb([x as u8, y as u8, 77]));
        let out = apply_bevel(&canvas, &style);
        for (x, y, px) in canvas.enumerate_pixels() {
            assert_eq!(out.get_pixel(x + t, y + t), px, "({x}, {y})");
        }
        // The ring right outside the poster is bevel, not poster.
        assert_eq!(out.get_pixel(t + 5, t - 1).0, [160; 3]);
        assert_eq!(out.get_pixel(t + 5, t + 30).0, [230; 3]);
    }

    #[test]
    fn passe_partout_centers_layer() {
        let style = small_style();
        let layer = RgbImage::from_pixel(24, 34, image::Rgb([9, 9, 9]));
        let out = apply_passe_partout(&layer, &style);
        assert_eq!(out.dimensions(), (32, 42));
        assert_eq!(out.get_pixel(3, 3).0, [248; 3]);
        assert_eq!(out.get_pixel(4, 4).0, [9; 3]);
        assert_eq!(out.get_pixel(27, 37).0, [9; 3]);
        assert_eq!(out.get_pixel(28, 38).0, [248; 3]);
    }

    #[test]
    fn padded_size_hits_ratio_without_shrinking() {
        let aspect = AspectRatio::PORTRAIT_9_16;
        assert_eq!(padded_size(2180, 3180, aspect), (2180, 3875));
        assert_eq!(padded_size(900, 3200, aspect), (1800, 3200));
        assert_eq!(padded_size(900, 1600, aspect), (900, 1600));
        for (w, h) in [(1, 1), (17, 400), (400, 17), (1234, 987)] {
            let (fw, fh) = padded_size(w, h, aspect);
            assert!(fw >= w && fh >= h);
            let ratio_err = (f64::from(fw) * 16.0 - f64::from(fh) * 9.0).abs();
            assert!(ratio_err <= 16.0, "{w}x{h} -> {fw}x{fh}");
        }
    }

    #[test]
    fn pad_to_aspect_letterboxes() {
        let img = RgbImage::from_pixel(9, 9, image::Rgb([0, 0, 0]));
        let (out, (x, y)) = pad_to_aspect(&img, AspectRatio::PORTRAIT_9_16, Rgb8::WHITE);
        assert_eq!(out.dimensions(), (9, 16));
        assert_eq!((x, y), (0, 3));
        assert_eq!(out.get_pixel(0, 2).0, [255; 3]);
        assert_eq!(out.get_pixel(0, 3).0, [0; 3]);
    }

    #[test]
    fn rotated_rect_tracks_ccw_rotation() {
        let mut img = RgbImage::from_pixel(10, 6, image::Rgb([0, 0, 0]));
        let rect = PixelRect::new(1, 4, 3, 2);
        fill_rect(&mut img, rect, Rgb8::WHITE);
        let rotated = imageops::rotate270(&img);
        let r = rect.rotated_ccw(10);
        for y in 0..rotated.height() {
            for x in 0..rotated.width() {
                let lit = rotated.get_pixel(x, y).0 == [255; 3];
                assert_eq!(lit, r.contains(x, y), "({x},{y})");
            }
        }
    }
}
