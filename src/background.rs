//! Two-phase background resolution.
//!
//! The compositor never deals with fetch/decode failures: it receives either
//! a decoded bitmap or the instruction to fall back to the solid background
//! color. A bad image source therefore degrades the card, never the render.

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;

use crate::{
    color::Rgba8,
    error::{ColorblockError, ColorblockResult},
    spec::RenderSpec,
};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Outcome of background resolution for one render.
#[derive(Clone, Debug)]
pub enum BackgroundResult {
    /// Draw this bitmap stretched to cover the canvas.
    Bitmap(PreparedImage),
    /// Fill the canvas with the spec's background color.
    FallbackColor(Rgba8),
}

/// Decode image bytes and premultiply in place.
pub fn decode_image(bytes: &[u8]) -> ColorblockResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[derive(Clone, Debug, Default)]
pub struct BackgroundResolverOpts {
    /// Optional HTTP timeout; expiry takes the fallback-fill path.
    pub timeout: Option<Duration>,
    /// Origin used to resolve root-relative sources (leading `/`), as the
    /// browser preview would resolve them against the current host.
    pub base_origin: Option<String>,
}

/// Resolves a spec's background source into a [`BackgroundResult`].
pub struct BackgroundResolver {
    client: reqwest::blocking::Client,
    base_origin: Option<url::Url>,
}

impl BackgroundResolver {
    pub fn new(opts: BackgroundResolverOpts) -> ColorblockResult<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("build HTTP client")?;

        let base_origin = match opts.base_origin.as_deref() {
            Some(origin) => Some(
                url::Url::parse(origin)
                    .map_err(|e| ColorblockError::validation(format!("invalid base origin: {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            client,
            base_origin,
        })
    }

    /// Resolve the background for `spec`. Never fails: every fetch or
    /// decode problem is logged and collapses into the fallback fill.
    pub fn resolve(&self, spec: &RenderSpec) -> BackgroundResult {
        let Some(source) = spec.background_image_url.as_deref() else {
            return BackgroundResult::FallbackColor(spec.background_color);
        };

        match self.load(source) {
            Ok(image) => BackgroundResult::Bitmap(image),
            Err(err) => {
                tracing::warn!(source, error = %err, "background image unavailable, using solid fill");
                BackgroundResult::FallbackColor(spec.background_color)
            }
        }
    }

    fn load(&self, source: &str) -> ColorblockResult<PreparedImage> {
        let bytes = self.fetch_bytes(source)?;
        decode_image(&bytes)
    }

    fn fetch_bytes(&self, source: &str) -> ColorblockResult<Vec<u8>> {
        if source.starts_with("http://") || source.starts_with("https://") {
            return self.http_get(source);
        }

        if source.starts_with('/') {
            // Root-relative sources only make sense against a configured
            // origin (the interactive context); otherwise they cannot be
            // fetched and the caller falls back.
            let origin = self.base_origin.as_ref().ok_or_else(|| {
                ColorblockError::validation(format!(
                    "relative background source '{source}' without a base origin"
                ))
            })?;
            let joined = origin
                .join(source)
                .map_err(|e| ColorblockError::validation(format!("join '{source}': {e}")))?;
            return self.http_get(joined.as_str());
        }

        std::fs::read(source).with_context(|| format!("read background file '{source}'"))
            .map_err(ColorblockError::from)
    }

    fn http_get(&self, url: &str) -> ColorblockResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ColorblockError::validation(format!(
                "GET {url} returned status {status}"
            )));
        }
        let bytes = resp
            .bytes()
            .with_context(|| format!("read body of {url}"))?;
        Ok(bytes.to_vec())
    }
}
