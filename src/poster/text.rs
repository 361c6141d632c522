use std::borrow::Cow;
use std::path::Path;

use image::RgbImage;

use crate::foundation::color::Rgb8;
use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::premul_over_opaque;

/// Where a typeface's bytes came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontSource {
    /// The configured font file.
    Custom,
    /// A system sans-serif face used after the configured file failed to load.
    SystemFallback,
    /// No face could be found; text is measured as zero-width and not drawn.
    Unavailable,
}

/// A font registered with the layout engine, ready for shaping and rasterization.
#[derive(Clone)]
pub(crate) struct Typeface {
    family: Option<String>,
    size_px: f32,
    pub(crate) source: FontSource,
}

/// Laid-out single-line text.
pub(crate) struct TextBlock {
    layout: parley::Layout<Rgb8>,
    width: f32,
    height: f32,
}

impl TextBlock {
    pub(crate) fn width(&self) -> u32 {
        self.width.ceil().max(0.0) as u32
    }

    pub(crate) fn height(&self) -> u32 {
        self.height.ceil().max(0.0) as u32
    }
}

/// Shapes text with Parley and rasterizes glyph runs with `vello_cpu`.
pub(crate) struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgb8>,
    fallback: Option<Option<(Vec<u8>, u32)>>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fallback: None,
        }
    }

    /// Load a font file, falling back to a system sans-serif face when it cannot be used.
    pub(crate) fn load_typeface(&mut self, path: &Path, size_px: f32) -> Typeface {
        match std::fs::read(path)
            .map_err(PosterError::from)
            .and_then(|bytes| self.register(bytes, 0))
        {
            Ok(family) => Typeface {
                family: Some(family),
                size_px,
                source: FontSource::Custom,
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "font unavailable, using fallback");
                self.fallback_typeface(size_px)
            }
        }
    }

    fn fallback_typeface(&mut self, size_px: f32) -> Typeface {
        let unavailable = Typeface {
            family: None,
            size_px,
            source: FontSource::Unavailable,
        };
        let Some((bytes, index)) = self.fallback_bytes() else {
            tracing::warn!("no system font found, text will not be drawn");
            return unavailable;
        };
        match self.register(bytes, index) {
            Ok(family) => Typeface {
                family: Some(family),
                size_px,
                source: FontSource::SystemFallback,
            },
            Err(err) => {
                tracing::warn!(%err, "system fallback font could not be registered");
                unavailable
            }
        }
    }

    fn fallback_bytes(&mut self) -> Option<(Vec<u8>, u32)> {
        self.fallback
            .get_or_insert_with(find_system_sans_serif)
            .clone()
    }

    /// Register font bytes and return the family name of the face at `index`.
    fn register(&mut self, bytes: Vec<u8>, index: u32) -> PosterResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        let family_id = families
            .iter()
            .find(|(_, fonts)| fonts.iter().any(|f| f.index() == index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| PosterError::render("no font families registered from font bytes"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PosterError::render("registered font family has no name"))?
            .to_string();
        Ok(family)
    }

    /// Shape `text` on a single unbounded line.
    pub(crate) fn layout(&mut self, face: &Typeface, text: &str, color: Rgb8) -> TextBlock {
        let Some(family) = face.family.as_ref() else {
            return TextBlock {
                layout: parley::Layout::default(),
                width: 0.0,
                height: 0.0,
            };
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(face.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(color));

        let mut layout: parley::Layout<Rgb8> = builder.build(text);
        layout.break_all_lines(None);
        let width = layout.width();
        let height = layout.height();
        TextBlock {
            layout,
            width,
            height,
        }
    }

    /// Rendered pixel width of `text`.
    pub(crate) fn measure(&mut self, face: &Typeface, text: &str) -> u32 {
        self.layout(face, text, Rgb8::BLACK).width()
    }

    /// Draw a laid-out block with its top-left corner at `(x, y)`, clipping to the canvas.
    pub(crate) fn draw(
        &mut self,
        face: &Typeface,
        block: &TextBlock,
        canvas: &mut RgbImage,
        x: i64,
        y: i64,
    ) -> PosterResult<()> {
        if face.family.is_none() {
            return Ok(());
        }
        let (w, h) = (block.width(), block.height());
        if w == 0 || h == 0 {
            return Ok(());
        }
        let w16: u16 = w
            .try_into()
            .map_err(|_| PosterError::render("text width exceeds u16"))?;
        let h16: u16 = h
            .try_into()
            .map_err(|_| PosterError::render("text height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        for line in block.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, 255,
                ));
                // Positioned glyphs carry the run offset and the line baseline.
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(run.run().font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);

        blit_premul(canvas, pixmap.data_as_u8_slice(), w, h, x, y);
        Ok(())
    }
}

/// Composite a premultiplied RGBA8 buffer over an opaque canvas.
pub(crate) fn blit_premul(canvas: &mut RgbImage, src: &[u8], w: u32, h: u32, x: i64, y: i64) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    for sy in 0..h {
        let dy = y + i64::from(sy);
        if dy < 0 || dy >= ch {
            continue;
        }
        for sx in 0..w {
            let dx = x + i64::from(sx);
            if dx < 0 || dx >= cw {
                continue;
            }
            let i = ((sy * w + sx) * 4) as usize;
            let s = [src[i], src[i + 1], src[i + 2], src[i + 3]];
            if s[3] == 0 {
                continue;
            }
            let px = canvas.get_pixel_mut(dx as u32, dy as u32);
            px.0 = premul_over_opaque(px.0, s);
        }
    }
}

fn find_system_sans_serif() -> Option<(Vec<u8>, u32)> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let id = db
        .query(&usvg::fontdb::Query {
            families: &[usvg::fontdb::Family::SansSerif],
            ..Default::default()
        })
        .or_else(|| db.faces().next().map(|f| f.id))?;
    db.with_face_data(id, |data, index| (data.to_vec(), index))
}

/// Greedy word wrap against a pixel-width measure.
///
/// Each line is the longest run of whitespace-separated words whose measured width fits
/// `max_width`. A word that does not fit on its own still gets a line to itself.
pub fn wrap_words(text: &str, max_width: u32, mut measure: impl FnMut(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(px_per_char: u32) -> impl FnMut(&str) -> u32 {
        move |s: &str| s.chars().count() as u32 * px_per_char
    }

    #[test]
    fn wrap_keeps_every_line_within_width() {
        let text = "Long enough text to require wrapping across multiple lines given a narrow margin";
        let lines = wrap_words(text, 520, mono(35));
        assert!(lines.len() >= 2);
        for line in &lines {
            let single_word = !line.contains(' ');
            assert!(single_word || line.chars().count() as u32 * 35 <= 520, "{line}");
        }
    }

    #[test]
    fn wrap_preserves_word_sequence() {
        let text = "  the   spice\tmust flow\nand so must   the words ";
        let lines = wrap_words(text, 60, mono(6));
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn overlong_word_sits_alone() {
        let lines = wrap_words("a supercalifragilistic b", 10, mono(1));
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn empty_text_yields_no_lines() {
        assert!(wrap_words("   ", 100, mono(1)).is_empty());
    }

    #[test]
    fn blit_clips_to_canvas() {
        let mut canvas = RgbImage::from_pixel(2, 2, image::Rgb([255, 255, 255]));
        let src = [0u8, 0, 0, 255].repeat(4);
        blit_premul(&mut canvas, &src, 2, 2, 1, 1);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [0, 0, 0]);
    }

    /// Bounding box `(x0, y0, x1, y1)` of dark pixels, inclusive.
    fn ink_bounds(img: &RgbImage) -> Option<(u32, u32, u32, u32)> {
        img.enumerate_pixels()
            .filter(|(_, _, p)| p.0.iter().map(|&c| u32::from(c)).sum::<u32>() < 3 * 128)
            .fold(None, |acc, (x, y, _)| match acc {
                None => Some((x, y, x, y)),
                Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
            })
    }

    #[test]
    fn drawn_text_spans_its_laid_out_box() {
        let mut engine = TextEngine::new();
        let face = engine.fallback_typeface(30.0);
        if face.source == FontSource::Unavailable {
            eprintln!("no system font, skipping");
            return;
        }

        let block = engine.layout(&face, "Dune (2021) WWWWW", Rgb8::BLACK);
        let (w, h) = (block.width(), block.height());
        assert!(w > 100 && h > 10, "{w}x{h}");
        assert_eq!(engine.measure(&face, "Dune (2021) WWWWW"), w);

        let mut canvas = RgbImage::from_pixel(w + 20, h + 20, image::Rgb([255, 255, 255]));
        engine.draw(&face, &block, &mut canvas, 10, 10).unwrap();

        let (x0, y0, x1, y1) = ink_bounds(&canvas).expect("text left ink");
        assert!(x1 - x0 + 1 >= w * 8 / 10, "ink x {x0}..{x1} for width {w}");
        assert!(y1 - y0 + 1 >= h / 2, "ink y {y0}..{y1} for height {h}");
        assert!(x0 >= 10 && y0 >= 10 && x1 < 10 + w + 2 && y1 < 10 + h + 2);
    }

    #[test]
    fn fallback_family_matches_registered_face() {
        let Some((bytes, index)) = find_system_sans_serif() else {
            return;
        };
        let mut engine = TextEngine::new();
        let family = engine.register(bytes, index).unwrap();
        let id = engine.font_ctx.collection.family_id(&family).unwrap();
        let info = engine.font_ctx.collection.family(id).unwrap();
        assert!(info.fonts().iter().any(|f| f.index() == index));
    }

    #[test]
    fn unavailable_face_measures_zero() {
        let mut engine = TextEngine::new();
        let face = Typeface {
            family: None,
            size_px: 30.0,
            source: FontSource::Unavailable,
        };
        assert_eq!(engine.measure(&face, "Dune (2021)"), 0);
        let block = engine.layout(&face, "Dune", Rgb8::BLACK);
        let mut canvas = RgbImage::new(4, 4);
        engine.draw(&face, &block, &mut canvas, 0, 0).unwrap();
    }
}
