use anyhow::Result;
use qrcode::{render::unicode, QrCode};

/// Renders the link as a QR code that can be scanned from the terminal.
pub fn format_qr_code(link: &str) -> Result<String> {
    let code = QrCode::new(link.as_bytes())?;
    let qr = code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Dark)
        .light_color(unicode::Dense1x2::Light)
        .quiet_zone(true)
        .build();
    Ok(qr)
}

pub fn print_qr_code(link: String) -> Result<()> {
    let qr = format_qr_code(&link)?;
    println!("{link}");
    println!("{qr}");
    Ok(())
}
