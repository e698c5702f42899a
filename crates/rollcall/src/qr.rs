//! QR codes for session form links.
//!
//! The code encodes the form link verbatim. The HTTP view ships it as an SVG
//! document and the CLI prints it with block characters.

use qrcode::render::{svg, unicode};
use qrcode::QrCode;

use crate::error::Result;

/// Minimum edge length of the rendered SVG, in pixels.
const SVG_MIN_SIZE: u32 = 200;

/// Render `payload` as an SVG document.
///
/// # Errors
///
/// Returns an error if the payload does not fit in a QR code.
pub fn svg(payload: &str) -> Result<String> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(SVG_MIN_SIZE, SVG_MIN_SIZE)
        .build())
}

/// Render `payload` for a terminal, two modules per character cell.
///
/// Colors are inverted so the code scans on dark terminal backgrounds.
///
/// # Errors
///
/// Returns an error if the payload does not fit in a QR code.
pub fn terminal(payload: &str) -> Result<String> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}
