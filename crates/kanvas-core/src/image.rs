//! Embedded image payloads (thumbnails, backgrounds, image field values)
//!
//! Images travel inside the JSON snapshot. With a known MIME type they are
//! written as a `data:<mime>;base64,...` URL, otherwise as bare base64.
//! Both forms are accepted when reading.

use crate::config::ImageLimits;
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Raw image bytes plus their MIME type when known
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self { mime, bytes }
    }

    /// Validate an uploaded file and wrap it.
    ///
    /// Rejects unsupported MIME types and payloads over `limits.max_bytes`
    /// before anything is stored.
    pub fn from_upload(mime: &str, bytes: Vec<u8>, limits: &ImageLimits) -> Result<Self> {
        if !limits.allows(mime) {
            return Err(Error::UnsupportedImageType(mime.to_string()));
        }
        if bytes.len() > limits.max_bytes {
            return Err(Error::ImageTooLarge {
                size: bytes.len(),
                max: limits.max_bytes,
            });
        }
        Ok(Self {
            mime: Some(mime.to_ascii_lowercase()),
            bytes,
        })
    }

    /// Parse a data URL or a bare base64 string
    pub fn parse(encoded: &str) -> Result<Self> {
        let (mime, payload) = match encoded.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::InvalidImageData("data URL has no payload".into()))?;
                let mime = header
                    .strip_suffix(";base64")
                    .ok_or_else(|| Error::InvalidImageData("data URL is not base64".into()))?;
                let mime = if mime.is_empty() {
                    None
                } else {
                    Some(mime.to_string())
                };
                (mime, payload)
            }
            None => (None, encoded),
        };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::InvalidImageData(e.to_string()))?;
        Ok(Self { mime, bytes })
    }

    /// Bare base64 of the payload
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Wire form: a data URL if the MIME type is known, bare base64 otherwise
    pub fn encode(&self) -> String {
        match &self.mime {
            Some(mime) => format!("data:{};base64,{}", mime, self.to_base64()),
            None => self.to_base64(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for ImageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        ImageData::parse(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_accepts_png() {
        let image = ImageData::from_upload("image/png", vec![1, 2, 3], &ImageLimits::default())
            .unwrap();
        assert_eq!(image.mime.as_deref(), Some("image/png"));
        assert_eq!(image.len(), 3);
    }

    #[test]
    fn test_upload_rejects_type() {
        let err = ImageData::from_upload("text/plain", vec![0], &ImageLimits::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedImageType(_)));
    }

    #[test]
    fn test_upload_rejects_size() {
        let limits = ImageLimits {
            max_bytes: 4,
            ..ImageLimits::default()
        };
        let err = ImageData::from_upload("image/gif", vec![0; 5], &limits).unwrap_err();
        assert!(matches!(err, Error::ImageTooLarge { size: 5, max: 4 }));

        // Exactly at the limit is fine
        assert!(ImageData::from_upload("image/gif", vec![0; 4], &limits).is_ok());
    }

    #[test]
    fn test_data_url_encoding() {
        let image = ImageData::new(Some("image/png".into()), b"hello".to_vec());
        assert_eq!(image.encode(), "data:image/png;base64,aGVsbG8=");

        let parsed = ImageData::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_bare_base64() {
        let parsed = ImageData::parse("aGVsbG8=").unwrap();
        assert_eq!(parsed.mime, None);
        assert_eq!(parsed.bytes, b"hello");
        assert_eq!(parsed.encode(), "aGVsbG8=");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ImageData::parse("data:image/png,plain").is_err());
        assert!(ImageData::parse("not base64 at all!").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let image = ImageData::new(Some("image/jpeg".into()), vec![255, 216]);
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, "\"data:image/jpeg;base64,/9g=\"");
        let back: ImageData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }
}
