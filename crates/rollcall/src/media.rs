//! Encoded images and inline data URIs.
//!
//! Both capture widgets hand the form an [`EncodedImage`]: the bytes of a
//! complete image file plus its MIME type. Records store it inline as a
//! `data:<mime>;base64,<payload>` string.

use std::fmt;
use std::io::Cursor;

use base64::engine::general_purpose;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Callback a capture widget invokes with a new image or an explicit absence.
pub type ImageCallback = Box<dyn FnMut(Option<EncodedImage>) + Send>;

/// A self-contained encoded raster image.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    bytes: Vec<u8>,
}

impl EncodedImage {
    /// Wrap already-encoded bytes without inspecting them.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Wrap the contents of an image file, detecting its format from the bytes.
    ///
    /// The bytes are kept exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedImage`] if the bytes are empty or not a
    /// recognized image format.
    pub fn from_file_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::unsupported_image("file is empty"));
        }
        let format = image::guess_format(&bytes)
            .map_err(|_| Error::unsupported_image("content is not a recognized image format"))?;
        Ok(Self::new(format.to_mime_type(), bytes))
    }

    /// Encode an RGBA raster as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_png(raster: &RgbaImage) -> Result<Self> {
        let mut png: Vec<u8> = Vec::new();
        raster.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self::new(ImageFormat::Png.to_mime_type(), png))
    }

    /// Encode an RGB frame as JPEG at the given quality (1-100).
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Self> {
        let mut jpeg: Vec<u8> = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
            encoder.encode_image(frame)?;
        }
        Ok(Self::new(ImageFormat::Jpeg.to_mime_type(), jpeg))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataUri`] if the prefix, media type or payload
    /// is malformed.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::invalid_data_uri("missing data: prefix"))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| Error::invalid_data_uri("only base64 payloads are supported"))?;
        if !mime_type.starts_with("image/") {
            return Err(Error::invalid_data_uri(format!(
                "not an image media type: {mime_type}"
            )));
        }
        let bytes = general_purpose::STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| Error::invalid_data_uri(e.to_string()))?;
        Ok(Self::new(mime_type, bytes))
    }

    /// Render as an inline `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Decode the image back into pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be decoded.
    pub fn decode(&self) -> Result<DynamicImage> {
        let image = match ImageFormat::from_mime_type(&self.mime_type) {
            Some(format) => image::load_from_memory_with_format(&self.bytes, format)?,
            None => image::load_from_memory(&self.bytes)?,
        };
        Ok(image)
    }

    /// The image's MIME type, e.g. `image/png`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the image and return its encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the encoded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether there are no encoded bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Preferred file extension for the MIME type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for EncodedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_uri())
    }
}

impl<'de> Deserialize<'de> for EncodedImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        Self::from_data_uri(&uri).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    #[test]
    fn test_png_data_uri_prefix() {
        let raster = RgbaImage::from_pixel(4, 4, Rgba([30, 58, 138, 255]));
        let png = EncodedImage::encode_png(&raster).unwrap();

        assert_eq!(png.mime_type(), "image/png");
        assert!(png.to_data_uri().starts_with("data:image/png;base64,"));
        assert_eq!(png.extension(), "png");
    }

    #[test]
    fn test_data_uri_parse_keeps_bytes() {
        let original = EncodedImage::new("image/gif", b"GIF89a-not-really".to_vec());
        let parsed = EncodedImage::from_data_uri(&original.to_data_uri()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_data_uri_rejects_missing_prefix() {
        let err = EncodedImage::from_data_uri("image/png;base64,AAAA").unwrap_err();
        assert!(matches!(err, Error::InvalidDataUri { .. }));
    }

    #[test]
    fn test_data_uri_rejects_non_image() {
        let err = EncodedImage::from_data_uri("data:text/plain;base64,aGk=").unwrap_err();
        assert!(err.to_string().contains("text/plain"));
    }

    #[test]
    fn test_data_uri_rejects_bad_base64() {
        let err = EncodedImage::from_data_uri("data:image/png;base64,***").unwrap_err();
        assert!(matches!(err, Error::InvalidDataUri { .. }));
    }

    #[test]
    fn test_jpeg_quality_and_decode() {
        let frame = RgbImage::from_pixel(16, 16, Rgb([200, 10, 10]));
        let jpeg = EncodedImage::encode_jpeg(&frame, 90).unwrap();

        assert_eq!(jpeg.mime_type(), "image/jpeg");
        let decoded = jpeg.decode().unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert!(decoded.get_pixel(8, 8)[0] > 150);
    }

    #[test]
    fn test_from_file_bytes_detects_png() {
        let raster = RgbaImage::new(2, 2);
        let png = EncodedImage::encode_png(&raster).unwrap();
        let bytes = png.bytes().to_vec();

        let detected = EncodedImage::from_file_bytes(bytes.clone()).unwrap();
        assert_eq!(detected.mime_type(), "image/png");
        assert_eq!(detected.bytes(), bytes.as_slice());
    }

    #[test]
    fn test_from_file_bytes_rejects_text() {
        let err = EncodedImage::from_file_bytes(b"hello world".to_vec()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedImage { .. }));
    }

    #[test]
    fn test_from_file_bytes_rejects_empty() {
        let err = EncodedImage::from_file_bytes(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_serde_as_data_uri() {
        let image = EncodedImage::new("image/png", vec![1, 2, 3]);
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, "\"data:image/png;base64,AQID\"");

        let back: EncodedImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_into_bytes_returns_payload() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([0, 128, 255]));
        let jpeg = EncodedImage::encode_jpeg(&frame, 90).unwrap();
        let expected = jpeg.bytes().to_vec();

        let bytes = jpeg.into_bytes();
        assert_eq!(bytes, expected);
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_debug_hides_payload() {
        let image = EncodedImage::new("image/png", vec![0; 1024]);
        let debug = format!("{image:?}");
        assert!(debug.contains("1024"));
        assert!(!debug.contains("0, 0, 0"));
    }
}
