//! Loading serialized chart artifacts
//!
//! Artifacts are read into memory and their declared dimensions parsed from
//! the header: SVG `width`/`height` (or `viewBox`), PNG IHDR, PDF MediaBox.

use super::PanelError;
use crate::config::ChartFormat;
use crate::native::PanelImage;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fs;
use std::path::Path;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

static SVG_ROOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<svg\b[^>]*>").expect("valid svg root regex"));
static SVG_WIDTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bwidth\s*=\s*["']([0-9.]+)(?:px|pt)?["']"#).expect("valid svg width regex"));
static SVG_HEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bheight\s*=\s*["']([0-9.]+)(?:px|pt)?["']"#).expect("valid svg height regex"));
static SVG_VIEWBOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bviewBox\s*=\s*["']\s*[-0-9.]+[\s,]+[-0-9.]+[\s,]+([0-9.]+)[\s,]+([0-9.]+)\s*["']"#)
        .expect("valid svg viewBox regex")
});
static PDF_MEDIABOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/MediaBox\s*\[\s*([-0-9.]+)\s+([-0-9.]+)\s+([-0-9.]+)\s+([-0-9.]+)\s*\]")
        .expect("valid pdf mediabox regex")
});

/// Read one artifact into a panel image
///
/// # Errors
///
/// - `Io` when the file cannot be read
/// - `EmptyArtifact` when the file has zero bytes
/// - `Undecodable` when the bytes do not match `format`
pub fn load_panel(path: &Path, format: ChartFormat) -> Result<PanelImage, PanelError> {
    let bytes = fs::read(path).map_err(|e| PanelError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if bytes.is_empty() {
        return Err(PanelError::EmptyArtifact(path.display().to_string()));
    }

    let dimensions = match format {
        ChartFormat::Svg => svg_dimensions(&bytes),
        ChartFormat::Png => Some(png_dimensions(&bytes).ok_or_else(|| PanelError::Undecodable {
            path: path.display().to_string(),
            reason: "missing PNG signature or IHDR chunk".to_string(),
        })?),
        ChartFormat::Pdf => {
            if !bytes.starts_with(b"%PDF") {
                return Err(PanelError::Undecodable {
                    path: path.display().to_string(),
                    reason: "missing %PDF header".to_string(),
                });
            }
            pdf_dimensions(&bytes)
        }
    };

    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(PanelImage {
        format,
        source_name,
        bytes,
        width: dimensions.map(|(w, _)| w),
        height: dimensions.map(|(_, h)| h),
    })
}

fn svg_dimensions(bytes: &[u8]) -> Option<(f64, f64)> {
    let root = SVG_ROOT_RE.find(bytes)?.as_bytes();
    let width = capture_f64(&SVG_WIDTH_RE, root, 1);
    let height = capture_f64(&SVG_HEIGHT_RE, root, 1);
    if let (Some(w), Some(h)) = (width, height) {
        return Some((w, h));
    }
    let caps = SVG_VIEWBOX_RE.captures(root)?;
    Some((parse_f64(caps.get(1)?.as_bytes())?, parse_f64(caps.get(2)?.as_bytes())?))
}

fn png_dimensions(bytes: &[u8]) -> Option<(f64, f64)> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    Some((width as f64, height as f64))
}

fn pdf_dimensions(bytes: &[u8]) -> Option<(f64, f64)> {
    let caps = PDF_MEDIABOX_RE.captures(bytes)?;
    let x0 = parse_f64(caps.get(1)?.as_bytes())?;
    let y0 = parse_f64(caps.get(2)?.as_bytes())?;
    let x1 = parse_f64(caps.get(3)?.as_bytes())?;
    let y1 = parse_f64(caps.get(4)?.as_bytes())?;
    Some(((x1 - x0).abs(), (y1 - y0).abs()))
}

fn capture_f64(re: &Regex, haystack: &[u8], group: usize) -> Option<f64> {
    parse_f64(re.captures(haystack)?.get(group)?.as_bytes())
}

fn parse_f64(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}
