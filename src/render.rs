//! The abstract 2D capability the compositor draws through.
//!
//! One conceptual algorithm serves both the interactive preview and the
//! final export by parameterizing the compositor over this trait instead of
//! duplicating the layout logic per runtime context. The shipped adapter is
//! [`CpuSurface`](crate::render_cpu::CpuSurface); tests use scripted fakes.

use crate::{background::PreparedImage, color::Rgba8, error::ColorblockResult, spec::TextAlign};

/// Weight of a text run. Headings are bold, everything else regular.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Typography for one zone: pixel size plus weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSpec {
    pub size_px: u32,
    pub weight: FontWeight,
}

/// Finished frame: row-major RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Measurement and painting capability for one render.
///
/// A surface is single-use: allocate one per render so concurrent renders
/// never share a work buffer.
pub trait DrawSurface {
    /// Measured advance width of `text` in canvas pixels.
    ///
    /// Fails fast when no usable font face is loaded; that is a setup bug,
    /// not a data problem.
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> ColorblockResult<f64>;

    /// Fill the whole canvas with a solid color.
    fn fill_canvas(&mut self, color: Rgba8) -> ColorblockResult<()>;

    /// Draw a decoded bitmap stretched to cover the whole canvas.
    fn draw_background_image(&mut self, image: &PreparedImage) -> ColorblockResult<()>;

    /// Paint one line of text. `anchor_x` is interpreted per `align`: the
    /// line's left edge, center, or right edge. `baseline_y` is the text
    /// baseline in canvas space.
    fn fill_text(
        &mut self,
        text: &str,
        anchor_x: f64,
        baseline_y: f64,
        font: &FontSpec,
        color: Rgba8,
        align: TextAlign,
    ) -> ColorblockResult<()>;

    /// Rasterize everything painted so far into a frame.
    fn into_frame(self) -> ColorblockResult<FrameRgba>
    where
        Self: Sized;
}
