use qrcode::render::svg;
use qrcode::QrCode;
use uuid::Uuid;

use crate::services::signature;

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    ImageError(#[from] image::ImageError),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TicketCodeError {
    #[error("Malformed ticket code")]
    Malformed,

    #[error("Ticket code signature does not match")]
    InvalidSignature,
}

/// Opaque string printed into a ticket's QR code: `<ticket id>.<hmac hex>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCode {
    pub ticket_id: Uuid,
    pub signature: String,
}

impl TicketCode {
    /// Signs a ticket id
    pub fn issue(ticket_id: Uuid, signing_key: &[u8]) -> Self {
        let signature = signature::sign(&ticket_id.to_string(), signing_key);
        Self {
            ticket_id,
            signature,
        }
    }

    /// Parses a scanned code and checks its signature
    pub fn verify(raw: &str, signing_key: &[u8]) -> Result<Self, TicketCodeError> {
        let (id_part, signature_part) = raw
            .trim()
            .split_once('.')
            .ok_or(TicketCodeError::Malformed)?;

        let ticket_id = Uuid::parse_str(id_part).map_err(|_| TicketCodeError::Malformed)?;

        if !signature::verify(&ticket_id.to_string(), signature_part, signing_key) {
            return Err(TicketCodeError::InvalidSignature);
        }

        Ok(Self {
            ticket_id,
            signature: signature_part.to_string(),
        })
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.ticket_id, self.signature)
    }
}

/// Generates a QR code SVG for a ticket code
pub fn generate_qr_svg(code: &str) -> Result<String, QrGenerationError> {
    let qr = QrCode::new(code.as_bytes())?;

    let svg = qr.render::<svg::Color>().min_dimensions(200, 200).build();

    Ok(svg)
}

/// Generates a QR code PNG for a ticket code
pub fn generate_qr_png(code: &str) -> Result<Vec<u8>, QrGenerationError> {
    use image::{ImageBuffer, Luma};

    let qr = QrCode::new(code.as_bytes())?;

    // Each module is 10x10 pixels
    let module_size = 10u32;
    let width = qr.width() as u32;
    let img_size = width * module_size;

    let mut img = ImageBuffer::<Luma<u8>, Vec<u8>>::new(img_size, img_size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let module_x = (x / module_size) as usize;
        let module_y = (y / module_size) as usize;
        *pixel = match qr[(module_x, module_y)] {
            qrcode::types::Color::Dark => Luma([0u8]),
            qrcode::types::Color::Light => Luma([255u8]),
        };
    }

    let mut png_data = Vec::new();
    image::DynamicImage::ImageLuma8(img).write_to(
        &mut std::io::Cursor::new(&mut png_data),
        image::ImageFormat::Png,
    )?;

    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signature::derive_key;

    #[test]
    fn test_issue_and_verify() {
        let key = derive_key("ticket-key");
        let ticket_id = Uuid::new_v4();

        let code = TicketCode::issue(ticket_id, &key);
        let encoded = code.encode();

        assert!(encoded.starts_with(&ticket_id.to_string()));
        assert_eq!(TicketCode::verify(&encoded, &key), Ok(code));
    }

    #[test]
    fn test_verify_rejects_other_ticket_id() {
        let key = derive_key("ticket-key");
        let code = TicketCode::issue(Uuid::new_v4(), &key);
        let forged = format!("{}.{}", Uuid::new_v4(), code.signature);

        assert_eq!(
            TicketCode::verify(&forged, &key),
            Err(TicketCodeError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let code = TicketCode::issue(Uuid::new_v4(), &derive_key("ticket-key"));

        assert_eq!(
            TicketCode::verify(&code.encode(), &derive_key("other-key")),
            Err(TicketCodeError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let key = derive_key("ticket-key");

        assert_eq!(
            TicketCode::verify("EventTicket-0001", &key),
            Err(TicketCodeError::Malformed)
        );
        assert_eq!(
            TicketCode::verify("not-a-uuid.abcd", &key),
            Err(TicketCodeError::Malformed)
        );
    }

    #[test]
    fn test_qr_svg_generation() {
        let code = TicketCode::issue(Uuid::new_v4(), &derive_key("ticket-key"));
        let svg_str = generate_qr_svg(&code.encode()).unwrap();

        assert!(svg_str.contains("<svg"));
        assert!(svg_str.contains("</svg>"));
    }

    #[test]
    fn test_qr_png_generation() {
        let code = TicketCode::issue(Uuid::new_v4(), &derive_key("ticket-key"));
        let png = generate_qr_png(&code.encode()).unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
