//! Core types for image generation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Image formats sent to and recognized from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Maps a MIME type back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Maps a decoder format to one the model accepts as-is.
    fn from_decoder_format(format: ::image::ImageFormat) -> Option<Self> {
        match format {
            ::image::ImageFormat::Png => Some(Self::Png),
            ::image::ImageFormat::Jpeg => Some(Self::Jpeg),
            ::image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A source photo loaded from disk and checked to decode.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Where the image was read from.
    pub path: PathBuf,
    /// Bytes sent to the model: the file itself, or a PNG re-encoding.
    pub data: Vec<u8>,
    /// Format of `data`.
    pub format: ImageFormat,
}

impl SourceImage {
    /// Reads `path` and checks that it decodes as an image.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::Input(format!("cannot read image {}: {e}", path.display())))?;
        Self::from_bytes(path, data)
    }

    /// Decodes bytes already in memory.
    ///
    /// PNG, JPEG and WebP are passed through untouched. Anything else the
    /// decoder understands (GIF, BMP, TIFF) is re-encoded as PNG.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let undecodable = |e: String| {
            Error::Input(format!("{} is not a decodable image: {e}", path.display()))
        };

        let reader = ::image::ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| undecodable(e.to_string()))?;
        let detected = reader.format();
        let decoded = reader.decode().map_err(|e| undecodable(e.to_string()))?;

        if let Some(format) = detected.and_then(ImageFormat::from_decoder_format) {
            return Ok(Self { path, data, format });
        }

        tracing::debug!(
            path = %path.display(),
            detected = ?detected,
            "re-encoding source image as PNG"
        );
        let mut png = Cursor::new(Vec::new());
        decoded
            .write_to(&mut png, ::image::ImageFormat::Png)
            .map_err(|e| undecodable(e.to_string()))?;

        Ok(Self {
            data: png.into_inner(),
            format: ImageFormat::Png,
            path,
        })
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// A request to re-shoot a product photo.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The assembled text prompt.
    pub prompt: String,
    /// The photo the model works from.
    pub image: SourceImage,
}

impl GenerationRequest {
    /// Creates a request, rejecting prompts that are blank.
    pub fn new(prompt: impl Into<String>, image: SourceImage) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(Error::Input("prompt is empty".into()));
        }
        Ok(Self { prompt, image })
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// MIME type reported by the API.
    pub mime_type: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved"]
pub struct GeneratedImage {
    /// Raw image bytes, exactly as returned.
    pub data: Vec<u8>,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, metadata: GenerationMetadata) -> Self {
        Self { data, metadata }
    }

    /// Best guess at the format, from the reported MIME type or the bytes.
    ///
    /// Informational only; the bytes are never re-validated before saving.
    pub fn format(&self) -> Option<ImageFormat> {
        self.metadata
            .mime_type
            .as_deref()
            .and_then(ImageFormat::from_mime_type)
            .or_else(|| ImageFormat::from_magic_bytes(&self.data))
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Writes the bytes verbatim to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let output_err = |source| Error::Output {
            path: path.to_path_buf(),
            source,
        };

        let mut file = std::fs::File::create(path).map_err(output_err)?;
        file.write_all(&self.data).map_err(output_err)?;
        file.flush().map_err(output_err)?;
        Ok(())
    }
}

/// Encodes a tiny solid image in `format`.
#[cfg(test)]
pub(crate) fn sample_image(format: ::image::ImageFormat) -> Vec<u8> {
    let image = match format {
        ::image::ImageFormat::Jpeg => ::image::DynamicImage::new_rgb8(4, 4),
        _ => ::image::DynamicImage::new_rgba8(4, 4),
    };
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), None);
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("IMAGE/JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("image/gif"), None);
    }

    #[test]
    fn test_source_image_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shoe.jpg");
        let jpeg = sample_image(::image::ImageFormat::Jpeg);
        std::fs::write(&path, &jpeg).unwrap();

        let image = SourceImage::load(&path).unwrap();
        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(image.data, jpeg);
        assert_eq!(image.path, path);
    }

    #[test]
    fn test_source_image_passes_webp_through() {
        let webp = sample_image(::image::ImageFormat::WebP);
        let image = SourceImage::from_bytes("shoe.webp", webp.clone()).unwrap();
        assert_eq!(image.format, ImageFormat::WebP);
        assert_eq!(image.data, webp);
    }

    #[test]
    fn test_source_image_reencodes_gif_and_bmp_as_png() {
        for format in [::image::ImageFormat::Gif, ::image::ImageFormat::Bmp] {
            let original = sample_image(format);
            let image = SourceImage::from_bytes("shoe.img", original.clone()).unwrap();

            assert_eq!(image.format, ImageFormat::Png);
            assert_ne!(image.data, original);
            assert_eq!(ImageFormat::from_magic_bytes(&image.data), Some(ImageFormat::Png));
            let decoded = ::image::load_from_memory(&image.data).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (4, 4));
        }
    }

    #[test]
    fn test_source_image_rejects_truncated_png() {
        let truncated = b"\x89PNG\r\n\x1a\ngarbage-not-an-image".to_vec();
        let err = SourceImage::from_bytes("broken.png", truncated).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert!(err.to_string().contains("broken.png"));

        let mut cut = sample_image(::image::ImageFormat::Png);
        cut.truncate(cut.len() / 2);
        let err = SourceImage::from_bytes("half.png", cut).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_source_image_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceImage::load(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn test_source_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"just some text, not pixels").unwrap();

        let err = SourceImage::load(&path).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_request_rejects_blank_prompt() {
        let image =
            SourceImage::from_bytes("a.png", sample_image(::image::ImageFormat::Png)).unwrap();
        let err = GenerationRequest::new("  \n", image.clone()).unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        assert!(GenerationRequest::new("A shoe", image).is_ok());
    }

    #[test]
    fn test_generated_image_format() {
        let image = GeneratedImage::new(
            PNG_MAGIC.to_vec(),
            GenerationMetadata {
                mime_type: Some("image/jpeg".into()),
                ..Default::default()
            },
        );
        // Reported MIME type wins over sniffing.
        assert_eq!(image.format(), Some(ImageFormat::Jpeg));

        let image = GeneratedImage::new(PNG_MAGIC.to_vec(), GenerationMetadata::default());
        assert_eq!(image.format(), Some(ImageFormat::Png));

        let image = GeneratedImage::new(b"opaque".to_vec(), GenerationMetadata::default());
        assert_eq!(image.format(), None);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        std::fs::write(&path, b"an older, longer file that should vanish").unwrap();

        let image = GeneratedImage::new(b"\x89PNG new".to_vec(), GenerationMetadata::default());
        image.save(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG new");
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.png");

        let image = GeneratedImage::new(vec![1, 2, 3], GenerationMetadata::default());
        let err = image.save(&path).unwrap_err();
        assert!(matches!(err, Error::Output { .. }));
        assert!(!path.exists());
    }
}
