use qrcode::{render::svg, QrCode};

use crate::traits::LinkBuilderError;

const QR_MIN_DIMENSION: u32 = 240;

/// Renders `data` as a QR code in an SVG document.
pub fn render_qr_svg(data: &str) -> Result<String, LinkBuilderError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| LinkBuilderError::QrCode(e.to_string()))?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    Ok(image)
}
