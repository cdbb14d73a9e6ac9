//! Validation and normalization of submitted signature images.
//!
//! Clients send either raw base64 (assumed PNG, which is what signature pads
//! produce) or a `data:` URL. Whatever comes in is stored as a normalized
//! `data:<mime>;base64,<payload>` string.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::domain::errors::CraError;

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 512 * 1024;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const ALLOWED_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/svg+xml"];

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureImage {
    mime: String,
    size: usize,
    data_url: String,
}

impl SignatureImage {
    pub fn parse(raw: &str, max_bytes: usize) -> Result<Self, CraError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CraError::validation("Signature image cannot be empty"));
        }

        let (mime, payload) = match raw.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| CraError::validation("Signature image data URL is malformed"))?;
                let mime = header
                    .strip_suffix(";base64")
                    .ok_or_else(|| CraError::validation("Signature image must be base64 encoded"))?
                    .to_ascii_lowercase();
                if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
                    return Err(CraError::validation(format!(
                        "Unsupported signature image type: {}",
                        mime
                    )));
                }
                (mime, payload)
            }
            None => ("image/png".to_string(), raw),
        };

        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(payload.as_bytes())
            .map_err(|e| CraError::validation(format!("Signature image is not valid base64: {}", e)))?;

        if bytes.is_empty() {
            return Err(CraError::validation("Signature image cannot be empty"));
        }
        if bytes.len() > max_bytes {
            return Err(CraError::validation(format!(
                "Signature image is too large ({} bytes, limit {})",
                bytes.len(),
                max_bytes
            )));
        }
        let magic_ok = match mime.as_str() {
            "image/png" => bytes.starts_with(PNG_MAGIC),
            "image/jpeg" => bytes.starts_with(JPEG_MAGIC),
            _ => std::str::from_utf8(&bytes).map(|s| s.contains("<svg")).unwrap_or(false),
        };
        if !magic_ok {
            return Err(CraError::validation(format!(
                "Signature image content does not match {}",
                mime
            )));
        }

        Ok(Self {
            data_url: format!("data:{};base64,{}", mime, payload),
            size: bytes.len(),
            mime,
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn into_data_url(self) -> String {
        self.data_url
    }
}

/// Base64 of a tiny PNG-looking payload, for tests across the crate
#[cfg(test)]
pub fn test_png(marker: &str) -> String {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(marker.as_bytes());
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_base64_is_treated_as_png() {
        let image = SignatureImage::parse(&test_png("a"), DEFAULT_MAX_IMAGE_BYTES).expect("valid image");
        assert_eq!(image.mime(), "image/png");
        assert_eq!(image.size(), 9);
        assert!(image.into_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_data_url_is_normalized() {
        let raw = format!("data:IMAGE/PNG;base64,{}", test_png("b"));
        let image = SignatureImage::parse(&raw, DEFAULT_MAX_IMAGE_BYTES).expect("valid image");
        assert_eq!(image.into_data_url(), format!("data:image/png;base64,{}", test_png("b")));

        let svg = format!("data:image/svg+xml;base64,{}", BASE64.encode("<svg xmlns='x'/>"));
        assert!(SignatureImage::parse(&svg, DEFAULT_MAX_IMAGE_BYTES).is_ok());
    }

    #[test]
    fn test_rejects_bad_images() {
        let cases = vec![
            String::new(),
            "   ".to_string(),
            "not base64 at all!".to_string(),
            "data:image/png,plain".to_string(),
            format!("data:text/html;base64,{}", test_png("x")),
            BASE64.encode("GIF89a"),
        ];
        for raw in cases {
            let err = SignatureImage::parse(&raw, DEFAULT_MAX_IMAGE_BYTES).expect_err("must reject");
            assert!(matches!(err, CraError::Validation(_)), "{:?} gave {:?}", raw, err);
        }
    }

    #[test]
    fn test_enforces_size_limit() {
        let err = SignatureImage::parse(&test_png("0123456789"), 12).expect_err("too large");
        assert!(err.to_string().contains("too large"));
    }
}
