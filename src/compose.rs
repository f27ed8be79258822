//! The compositing pipeline: resolve background, lay out text, paint.
//!
//! Control flow is strictly sequential per render. The only I/O is the
//! optional background fetch, already absorbed by the resolver, so from here
//! on a valid spec always produces a frame.

use crate::{
    background::{BackgroundResolver, BackgroundResult},
    error::ColorblockResult,
    layout::{self, CardLayout},
    render::{DrawSurface, FrameRgba},
    render_cpu::{CpuSurface, FontSet},
    spec::RenderSpec,
};

pub struct Compositor {
    resolver: BackgroundResolver,
}

impl Compositor {
    pub fn new(resolver: BackgroundResolver) -> Self {
        Self { resolver }
    }

    /// Render `spec` onto `surface`: background, then heading, statement
    /// and footer in that order. Returns the computed layout so callers
    /// (preview, tests) can inspect line placement.
    pub fn render<S: DrawSurface>(
        &self,
        spec: &RenderSpec,
        surface: &mut S,
    ) -> ColorblockResult<CardLayout> {
        spec.validate()?;

        match self.resolver.resolve(spec) {
            BackgroundResult::Bitmap(image) => surface.draw_background_image(&image)?,
            BackgroundResult::FallbackColor(color) => surface.fill_canvas(color)?,
        }

        let card = layout::layout_card(spec, |text, font| surface.measure_text(text, font))?;
        tracing::debug!(zones = card.zones.len(), "card layout computed");

        for zone in &card.zones {
            let color = spec.zone_font_color(zone.zone);
            for (i, line) in zone.lines.iter().enumerate() {
                if line.is_empty() {
                    // Blank manual lines only hold vertical space.
                    continue;
                }
                surface.fill_text(
                    line,
                    card.anchor_x,
                    zone.baseline_y(i),
                    &zone.font,
                    color,
                    card.alignment,
                )?;
            }
        }
        Ok(card)
    }

    /// One-shot render on a fresh CPU surface. Each call allocates its own
    /// surface, so overlapping renders never share a work buffer.
    pub fn render_frame(&self, spec: &RenderSpec, fonts: FontSet) -> ColorblockResult<FrameRgba> {
        let mut surface = CpuSurface::new(fonts);
        self.render(spec, &mut surface)?;
        surface.into_frame()
    }
}
