pub mod svg_qr_renderer;
