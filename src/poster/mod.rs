//! Compositor: turns a raw cover image plus metadata into the framed, rotated poster file.

use std::fmt;
use std::path::PathBuf;

use image::RgbImage;
use image::imageops;

use crate::config::PosterStyle;
use crate::foundation::error::{PosterError, PosterResult};

mod frame;
mod output;
mod qr;
mod text;

pub use frame::{PixelRect, padded_size};
pub use text::{FontSource, wrap_words};

use text::TextEngine;

/// Release year, or the sentinel for titles without one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Year {
    Known(i32),
    Unknown,
}

impl From<Option<i32>> for Year {
    fn from(v: Option<i32>) -> Self {
        v.map_or(Self::Unknown, Self::Known)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(y) => write!(f, "{y}"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Everything needed to render one poster.
#[derive(Clone, Debug, PartialEq)]
pub struct PosterRequest {
    pub raw_image_path: PathBuf,
    pub title: String,
    pub year: Year,
    pub tagline: Option<String>,
    pub external_url: Option<String>,
    pub output_path: PathBuf,
}

impl PosterRequest {
    /// `"{title} ({year})"`, drawn in the bottom-right corner of the mat.
    pub fn title_line(&self) -> String {
        format!("{} ({})", self.title, self.year)
    }
}

/// Layout facts about a written poster, in output-file pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeReport {
    pub width: u32,
    pub height: u32,
    /// Size of the padded layout before rotation.
    pub layout_width: u32,
    pub layout_height: u32,
    pub title_font: FontSource,
    pub tagline_font: FontSource,
    /// Title ink box, absent when nothing could be drawn.
    pub title_rect: Option<PixelRect>,
    pub qr_rect: Option<PixelRect>,
    pub tagline_lines: Vec<String>,
    /// Laid-out box of each tagline line, clipped to the poster.
    pub tagline_rects: Vec<PixelRect>,
}

/// Render `request` with `style` and atomically publish it at `request.output_path`.
///
/// An undecodable raw image fails before anything is written, so a previously published poster
/// stays intact.
#[tracing::instrument(skip_all, fields(title = %request.title, out = %request.output_path.display()))]
pub fn compose(request: &PosterRequest, style: &PosterStyle) -> PosterResult<ComposeReport> {
    style.validate()?;
    let format = output::output_format(&request.output_path)?;

    let raw = image::ImageReader::open(&request.raw_image_path)
        .map_err(|e| {
            PosterError::decode(format!(
                "open raw poster '{}': {e}",
                request.raw_image_path.display()
            ))
        })?
        .with_guessed_format()
        .map_err(|e| PosterError::decode(format!("sniff raw poster format: {e}")))?
        .decode()
        .map_err(|e| {
            PosterError::decode(format!(
                "decode raw poster '{}': {e}",
                request.raw_image_path.display()
            ))
        })?;
    tracing::debug!(
        raw_width = raw.width(),
        raw_height = raw.height(),
        "raw poster decoded"
    );

    let canvas = frame::working_canvas(&raw, style);
    let beveled = frame::apply_bevel(&canvas, style);
    let mut matted = frame::apply_passe_partout(&beveled, style);
    let (mat_w, mat_h) = matted.dimensions();

    let mut engine = TextEngine::new();
    let title_face = engine.load_typeface(&style.title.font_path, style.title.size_px);
    let tagline_face = engine.load_typeface(&style.tagline.font_path, style.tagline.size_px);

    let title = engine.layout(&title_face, &request.title_line(), style.title.color);
    let title_x = i64::from(mat_w) - i64::from(title.width()) - i64::from(style.title_margin_right);
    let title_y =
        i64::from(mat_h) - i64::from(title.height()) - i64::from(style.title_margin_bottom);
    engine.draw(&title_face, &title, &mut matted, title_x, title_y)?;
    let title_rect = (title.width() > 0 && title_x >= 0 && title_y >= 0).then(|| {
        PixelRect::new(
            title_x as u32,
            title_y as u32,
            title.width(),
            title.height(),
        )
    });

    let qr_rect = match request.external_url.as_deref() {
        Some(url) if !url.is_empty() => {
            let glyph = qr::render_qr(url, style)?;
            let x = style.qr_offset_left;
            let y = mat_h.saturating_sub(glyph.height());
            imageops::replace(&mut matted, &glyph, i64::from(x), i64::from(y));
            Some(PixelRect::new(x, y, glyph.width(), glyph.height()))
        }
        _ => None,
    };

    let (mut layout, (x_off, y_off)) =
        frame::pad_to_aspect(&matted, style.aspect, style.passe_background);
    let (layout_w, layout_h) = layout.dimensions();

    let (tagline_lines, tagline_rects) = match request.tagline.as_deref() {
        Some(tagline) if !tagline.trim().is_empty() => {
            draw_tagline(&mut engine, &tagline_face, tagline, style, &mut layout)?
        }
        _ => (Vec::new(), Vec::new()),
    };

    let rotated = imageops::rotate270(&layout);
    let to_output = |r: PixelRect| r.offset(x_off, y_off).rotated_ccw(layout_w);

    output::write_atomic(&rotated, &request.output_path, format)?;

    let report = ComposeReport {
        width: rotated.width(),
        height: rotated.height(),
        layout_width: layout_w,
        layout_height: layout_h,
        title_font: title_face.source,
        tagline_font: tagline_face.source,
        title_rect: title_rect.map(to_output),
        qr_rect: qr_rect.map(to_output),
        tagline_lines,
        tagline_rects: tagline_rects
            .into_iter()
            .map(|r| r.rotated_ccw(layout_w))
            .collect(),
    };
    tracing::info!(
        width = report.width,
        height = report.height,
        qr = report.qr_rect.is_some(),
        tagline_lines = report.tagline_lines.len(),
        "poster composed"
    );
    Ok(report)
}

fn draw_tagline(
    engine: &mut TextEngine,
    face: &text::Typeface,
    tagline: &str,
    style: &PosterStyle,
    layout: &mut RgbImage,
) -> PosterResult<(Vec<String>, Vec<PixelRect>)> {
    let (w, h) = layout.dimensions();
    let max_width = w.saturating_sub(2 * style.tagline_margin_x);
    let lines = wrap_words(tagline, max_width, |s| engine.measure(face, s));

    let line_height = i64::from(engine.layout(face, "A", style.tagline.color).height());
    let total = line_height * lines.len() as i64;
    let mut y = i64::from(h) - total - i64::from(style.tagline_margin_bottom);
    let mut rects = Vec::with_capacity(lines.len());
    for line in &lines {
        let block = engine.layout(face, line, style.tagline.color);
        let x = (i64::from(w) - i64::from(block.width())) / 2;
        engine.draw(face, &block, layout, x, y)?;
        rects.push(clip_rect(x, y, block.width(), block.height(), w, h));
        y += line_height;
    }
    Ok((lines, rects))
}

fn clip_rect(x: i64, y: i64, width: u32, height: u32, canvas_w: u32, canvas_h: u32) -> PixelRect {
    let x0 = x.clamp(0, i64::from(canvas_w));
    let y0 = y.clamp(0, i64::from(canvas_h));
    let x1 = (x + i64::from(width)).clamp(x0, i64::from(canvas_w));
    let y1 = (y + i64::from(height)).clamp(y0, i64::from(canvas_h));
    PixelRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_renders_sentinel() {
        assert_eq!(Year::Known(2021).to_string(), "2021");
        assert_eq!(Year::Unknown.to_string(), "Unknown");
        assert_eq!(Year::from(None), Year::Unknown);
        assert_eq!(Year::from(Some(1999)), Year::Known(1999));
    }

    #[test]
    fn title_line_formats_title_and_year() {
        let req = PosterRequest {
            raw_image_path: PathBuf::from("poster.jpg"),
            title: "Dune".to_string(),
            year: Year::Known(2021),
            tagline: None,
            external_url: None,
            output_path: PathBuf::from("poster_final.jpg"),
        };
        assert_eq!(req.title_line(), "Dune (2021)");
    }

    #[test]
    fn clip_rect_stays_on_canvas() {
        assert_eq!(clip_rect(5, 6, 10, 4, 100, 100), PixelRect::new(5, 6, 10, 4));
        assert_eq!(clip_rect(-3, 98, 10, 4, 100, 100), PixelRect::new(0, 98, 7, 2));
        assert_eq!(clip_rect(120, -9, 10, 4, 100, 100), PixelRect::new(100, 0, 0, 0));
    }
}
