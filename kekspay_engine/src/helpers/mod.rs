mod kekspay_link;
mod qr;

pub use kekspay_link::KeksPayLinkBuilder;
pub use qr::render_qr_svg;
