//! QR image rendering.
//!
//! The renderer does not interpret the content it is given; callers own the payload format.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use qrcode::{QrCode, render::svg};

/// Side length, in pixels, of rendered codes.
const MIN_DIMENSION: u32 = 256;

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("Failed to encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
}

/// Renders `content` as an SVG document.
pub fn render_svg(content: &str) -> Result<String, QrError> {
    let code = QrCode::new(content.as_bytes())?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Renders `content` as a `data:` URL that can be dropped straight into an `<img src>`.
pub fn render_data_url(content: &str) -> Result<String, QrError> {
    let svg = render_svg(content)?;
    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg_document() {
        let svg = render_svg("hello").unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn data_url_has_svg_prefix() {
        let url = render_data_url("payload").unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn different_content_renders_differently() {
        assert_ne!(render_svg("a").unwrap(), render_svg("b").unwrap());
    }
}
