//! Colorblock renders fixed 1080x1080 marketing cards ("colorblocks") from a
//! [`RenderSpec`]: optional heading, statement and footer text over a solid
//! color or cover-stretched background image.
//!
//! The pipeline is deterministic and sequential per render:
//!
//! - [`BackgroundResolver`] turns the spec's background source into a bitmap
//!   or the fallback fill, absorbing every fetch/decode failure
//! - [`layout`] greedily wraps each zone's text and resolves vertical
//!   placement on the fixed canvas
//! - [`Compositor`] paints through the portable [`DrawSurface`] capability,
//!   so the interactive preview and the batch export share one algorithm
//! - [`export`] encodes the frame as PNG and names the artifact

#![forbid(unsafe_code)]

pub mod background;
pub mod color;
pub mod compose;
pub mod error;
pub mod export;
pub mod layout;
pub mod render;
pub mod render_cpu;
pub mod spec;

pub use background::{
    BackgroundResolver, BackgroundResolverOpts, BackgroundResult, PreparedImage, decode_image,
};
pub use color::Rgba8;
pub use compose::Compositor;
pub use error::{ColorblockError, ColorblockResult};
pub use export::{download_file_name, encode_png, export_file_name};
pub use layout::{CANVAS_SIZE, CardLayout, PlacedZone, TEXT_MAX_WIDTH, layout_card, wrap_text};
pub use render::{DrawSurface, FontSpec, FontWeight, FrameRgba};
pub use render_cpu::{CpuSurface, FontFace, FontSet};
pub use spec::{RenderSpec, TextAlign, Zone};
