//! CPU raster surface: `parley` shaping and measurement, `vello_cpu`
//! painting. This is the adapter behind both the preview bitmap and the
//! exported PNG; the two contexts differ only in where the frame goes.

use std::{path::Path, sync::Arc};

use crate::{
    background::PreparedImage,
    color::Rgba8,
    error::{ColorblockError, ColorblockResult},
    layout::CANVAS_SIZE,
    render::{DrawSurface, FontSpec, FontWeight, FrameRgba},
    spec::TextAlign,
};

/// RGBA8 brush color carried through parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrushRgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// One loaded font face: raw bytes for parley registration plus the
/// `vello_cpu` font handle used when painting glyph runs.
#[derive(Clone)]
pub struct FontFace {
    bytes: Arc<Vec<u8>>,
    font_data: vello_cpu::peniko::FontData,
}

impl FontFace {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let bytes = Arc::new(bytes);
        let font_data =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from((*bytes).clone()), 0);
        Self { bytes, font_data }
    }

    pub fn from_path(path: &Path) -> ColorblockResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ColorblockError::surface(format!("read font '{}': {e}", path.display()))
        })?;
        Ok(Self::from_bytes(bytes))
    }
}

/// Regular and bold faces for one render context.
///
/// Headings paint bold; when no bold face is loaded they fall back to the
/// regular face. Measuring or painting with no face at all is a fail-fast
/// surface error.
#[derive(Clone, Default)]
pub struct FontSet {
    regular: Option<FontFace>,
    bold: Option<FontFace>,
}

impl FontSet {
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Self {
        Self {
            regular: Some(FontFace::from_bytes(regular)),
            bold: bold.map(FontFace::from_bytes),
        }
    }

    pub fn from_paths(regular: &Path, bold: Option<&Path>) -> ColorblockResult<Self> {
        Ok(Self {
            regular: Some(FontFace::from_path(regular)?),
            bold: bold.map(FontFace::from_path).transpose()?,
        })
    }

    fn face(&self, weight: FontWeight) -> ColorblockResult<&FontFace> {
        let face = match weight {
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontWeight::Regular => self.regular.as_ref(),
        };
        face.ok_or_else(|| {
            ColorblockError::surface("no font face loaded; text cannot be measured or painted")
        })
    }
}

/// Stateful helper for building parley layouts from raw font bytes.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape a single pre-wrapped line. Wrapping already happened in the
    /// layout engine, so lines are never broken here.
    fn layout_plain(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ColorblockResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ColorblockError::surface(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ColorblockError::surface("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ColorblockError::surface("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Single-use 1080x1080 raster surface. Allocate one per render; nothing is
/// shared between concurrent renders.
pub struct CpuSurface {
    ctx: vello_cpu::RenderContext,
    text_engine: TextLayoutEngine,
    fonts: FontSet,
}

impl CpuSurface {
    pub fn new(fonts: FontSet) -> Self {
        let side = CANVAS_SIZE as u16;
        Self {
            ctx: vello_cpu::RenderContext::new(side, side),
            text_engine: TextLayoutEngine::new(),
            fonts,
        }
    }
}

impl DrawSurface for CpuSurface {
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> ColorblockResult<f64> {
        let face = self.fonts.face(font.weight)?;
        let layout = self.text_engine.layout_plain(
            text,
            &face.bytes,
            font.size_px as f32,
            TextBrushRgba8::default(),
        )?;
        Ok(layout_advance_width(&layout))
    }

    fn fill_canvas(&mut self, color: Rgba8) -> ColorblockResult<()> {
        let side = f64::from(CANVAS_SIZE);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, side, side));
        Ok(())
    }

    fn draw_background_image(&mut self, image: &PreparedImage) -> ColorblockResult<()> {
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        // Stretch to cover the full canvas regardless of source aspect.
        let side = f64::from(CANVAS_SIZE);
        let sx = side / f64::from(image.width.max(1));
        let sy = side / f64::from(image.height.max(1));
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &str,
        anchor_x: f64,
        baseline_y: f64,
        font: &FontSpec,
        color: Rgba8,
        align: TextAlign,
    ) -> ColorblockResult<()> {
        if text.is_empty() {
            return Ok(());
        }

        let face = self.fonts.face(font.weight)?.clone();
        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let layout =
            self.text_engine
                .layout_plain(text, &face.bytes, font.size_px as f32, brush)?;

        let width = layout_advance_width(&layout);
        let x_left = match align {
            TextAlign::Left => anchor_x,
            TextAlign::Center => anchor_x - width / 2.0,
            TextAlign::Right => anchor_x - width,
        };
        let Some(first_line) = layout.lines().next() else {
            return Ok(());
        };
        // Glyph positions are relative to the layout's top edge; shift so
        // the first baseline lands on `baseline_y`.
        let layout_baseline = f64::from(first_line.metrics().baseline);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            x_left,
            baseline_y - layout_baseline,
        )));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&face.font_data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn into_frame(mut self) -> ColorblockResult<FrameRgba> {
        let side = CANVAS_SIZE as u16;
        let mut pixmap = vello_cpu::Pixmap::new(side, side);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRgba {
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

/// Advance width of a (single-line) layout in pixels.
fn layout_advance_width(layout: &parley::Layout<TextBrushRgba8>) -> f64 {
    let mut w = 0.0f64;
    for line in layout.lines() {
        w = w.max(f64::from(line.metrics().advance));
    }
    w
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ColorblockResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ColorblockError::surface("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ColorblockError::surface("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(ColorblockError::surface("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Local font used by shaping tests; absent on machines without the
    /// DejaVu package, in which case those tests silently pass.
    fn test_font() -> Option<FontSet> {
        let candidates = [
            "assets/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
        ];
        for path in candidates {
            if let Ok(bytes) = std::fs::read(path) {
                return Some(FontSet::from_bytes(bytes, None));
            }
        }
        None
    }

    #[test]
    fn empty_font_set_fails_fast() {
        let mut surface = CpuSurface::new(FontSet::default());
        let font = FontSpec {
            size_px: 60,
            weight: FontWeight::Regular,
        };
        let err = surface.measure_text("hello", &font).unwrap_err();
        assert!(err.to_string().contains("surface error:"));
    }

    #[test]
    fn bold_falls_back_to_regular_face() {
        let Some(fonts) = test_font() else {
            return;
        };
        assert!(fonts.face(FontWeight::Bold).is_ok());
    }

    #[test]
    fn fill_canvas_produces_solid_frame() {
        let surface_color = Rgba8::rgb(0x4c, 0xaf, 0x50);
        let mut surface = CpuSurface::new(FontSet::default());
        surface.fill_canvas(surface_color).unwrap();
        let frame = surface.into_frame().unwrap();

        assert_eq!(frame.width, CANVAS_SIZE);
        assert_eq!(frame.height, CANVAS_SIZE);
        assert_eq!(frame.data.len(), (CANVAS_SIZE * CANVAS_SIZE * 4) as usize);
        // Opaque color, so premultiplied equals straight.
        assert_eq!(&frame.data[0..4], &[0x4c, 0xaf, 0x50, 0xff]);
        let mid = ((540 * CANVAS_SIZE + 540) * 4) as usize;
        assert_eq!(&frame.data[mid..mid + 4], &[0x4c, 0xaf, 0x50, 0xff]);
    }

    #[test]
    fn measure_grows_with_text_length() {
        let Some(fonts) = test_font() else {
            return;
        };
        let mut surface = CpuSurface::new(fonts);
        let font = FontSpec {
            size_px: 60,
            weight: FontWeight::Regular,
        };
        let short = surface.measure_text("a", &font).unwrap();
        let long = surface.measure_text("a much longer line", &font).unwrap();
        assert!(short > 0.0);
        assert!(long > short);
    }

    #[test]
    fn measure_scales_with_font_size() {
        let Some(fonts) = test_font() else {
            return;
        };
        let mut surface = CpuSurface::new(fonts);
        let small = surface
            .measure_text(
                "statement",
                &FontSpec {
                    size_px: 30,
                    weight: FontWeight::Regular,
                },
            )
            .unwrap();
        let big = surface
            .measure_text(
                "statement",
                &FontSpec {
                    size_px: 60,
                    weight: FontWeight::Regular,
                },
            )
            .unwrap();
        assert!(big > small * 1.5);
    }

    #[test]
    fn fill_text_changes_pixels_near_baseline() {
        let Some(fonts) = test_font() else {
            return;
        };
        let mut surface = CpuSurface::new(fonts);
        surface.fill_canvas(Rgba8::BLACK).unwrap();
        surface
            .fill_text(
                "HELLO",
                540.0,
                540.0,
                &FontSpec {
                    size_px: 120,
                    weight: FontWeight::Regular,
                },
                Rgba8::WHITE,
                TextAlign::Center,
            )
            .unwrap();
        let frame = surface.into_frame().unwrap();

        // Some pixel in the band above the baseline must be non-black.
        let mut touched = false;
        for y in 420..540 {
            for x in 300..780 {
                let i = (y * CANVAS_SIZE as usize + x) * 4;
                if frame.data[i] != 0 || frame.data[i + 1] != 0 || frame.data[i + 2] != 0 {
                    touched = true;
                }
            }
        }
        assert!(touched, "glyph painting left the canvas untouched");
    }
}
