//! Turning finished frames into sink-ready artifacts: PNG bytes plus the
//! file-name conventions of the download and batch-export contexts.

use std::{
    io::Cursor,
    time::{SystemTime, UNIX_EPOCH},
};

use xxhash_rust::xxh3::xxh3_64;

use crate::{
    error::{ColorblockError, ColorblockResult},
    render::FrameRgba,
    spec::RenderSpec,
};

const SLUG_MAX_LEN: usize = 40;

/// Encode a frame as PNG bytes. Premultiplied frames are converted back to
/// straight alpha first; PNG stores straight RGBA.
pub fn encode_png(frame: &FrameRgba) -> ColorblockResult<Vec<u8>> {
    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut data);
    }

    let img = image::RgbaImage::from_raw(frame.width, frame.height, data).ok_or_else(|| {
        ColorblockError::encode("frame byte length does not match its dimensions")
    })?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ColorblockError::encode(format!("png encode: {e}")))?;
    Ok(buf)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

/// File name for the interactive "download as PNG" action: a timestamp
/// suffix keeps repeated downloads from clobbering each other.
pub fn download_file_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("colorblock-{millis}.png")
}

/// File name for the batch-export context: a sanitized slug of the heading
/// (or the statement when no heading exists) plus a short content hash so
/// cards with identical headings stay distinct in one archive.
pub fn export_file_name(spec: &RenderSpec) -> String {
    let heading = spec.heading.as_deref().unwrap_or("");
    let base = if heading.is_empty() {
        &spec.statement
    } else {
        heading
    };

    let fingerprint = xxh3_64(
        format!(
            "{}\u{1f}{}\u{1f}{}",
            heading,
            spec.statement,
            spec.footer.as_deref().unwrap_or("")
        )
        .as_bytes(),
    );

    format!(
        "{}-{:08x}.png",
        sanitize_slug(base),
        fingerprint & 0xffff_ffff
    )
}

fn sanitize_slug(s: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for ch in s.chars().flat_map(char::to_lowercase) {
        if out.len() >= SLUG_MAX_LEN {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if out.is_empty() {
        "colorblock".to_string()
    } else {
        out
    }
}
