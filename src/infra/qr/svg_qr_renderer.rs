use crate::domain::{models::rsvp::QrImage, ports::QrRenderer};
use crate::error::AppError;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use qrcode::{render::svg, QrCode};

const SVG_MIME: &str = "image/svg+xml";

pub struct SvgQrRenderer {
    min_dimension: u32,
}

impl SvgQrRenderer {
    pub fn new(min_dimension: u32) -> Self {
        Self { min_dimension }
    }
}

impl Default for SvgQrRenderer {
    fn default() -> Self {
        Self::new(200)
    }
}

#[async_trait]
impl QrRenderer for SvgQrRenderer {
    async fn render(&self, payload: &str) -> Result<QrImage, AppError> {
        if payload.is_empty() {
            return Err(AppError::Validation("QR payload must not be empty".into()));
        }

        let code = QrCode::new(payload.as_bytes())
            .map_err(|e| AppError::Dependency(format!("QR encoding failed: {}", e)))?;

        let image = code.render::<svg::Color>()
            .min_dimensions(self.min_dimension, self.min_dimension)
            .build();

        let data_url = format!("data:{};base64,{}", SVG_MIME, general_purpose::STANDARD.encode(image.as_bytes()));

        Ok(QrImage {
            payload: payload.to_string(),
            mime_type: SVG_MIME.to_string(),
            data_url,
            bytes: image.into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_renders_svg_data_url() {
        let renderer = SvgQrRenderer::default();
        let image = renderer.render("abc123TOKEN").await.unwrap();

        assert_eq!(image.payload, "abc123TOKEN");
        assert_eq!(image.mime_type, "image/svg+xml");
        assert!(image.data_url.starts_with("data:image/svg+xml;base64,"));

        let encoded = image.data_url.trim_start_matches("data:image/svg+xml;base64,");
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, image.bytes);
        assert!(String::from_utf8(decoded).unwrap().contains("<svg"));
    }

    #[tokio::test]
    async fn test_rejects_empty_payload() {
        let renderer = SvgQrRenderer::default();
        assert!(matches!(renderer.render("").await, Err(AppError::Validation(_))));
    }
}
