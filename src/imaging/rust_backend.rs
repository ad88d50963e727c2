//! Production image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader` with content sniffing |
//! | Orientation | `ImageDecoder::exif_metadata` + `Orientation::from_exif_chunk` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` into a `Vec<u8>` |
//!
//! Decoded pixels are normalised to 8-bit RGB or 8-bit grayscale, the two
//! layouts the JPEG encoder accepts. Alpha is dropped.

use super::backend::{BackendError, ImageAsset, ImageBackend};
use super::params::{OrientationTag, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::path::Path;

/// Decodes with content sniffing and encodes JPEG in memory.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Convert to a pixel layout the JPEG encoder can write.
fn to_jpeg_layout(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => image,
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<ImageAsset, BackendError> {
        let original_bytes = std::fs::metadata(path)?.len();

        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let mut decoder = reader.into_decoder().map_err(|e| decode_error(path, e))?;

        // Unreadable and missing EXIF are the same thing here: no tag.
        let orientation = decoder
            .exif_metadata()
            .ok()
            .flatten()
            .and_then(|chunk| Orientation::from_exif_chunk(&chunk))
            .map(OrientationTag::from);

        let image = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;

        Ok(ImageAsset {
            source: path.to_path_buf(),
            original_bytes,
            image: to_jpeg_layout(image),
            orientation,
        })
    }

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value());
        image
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode {
                quality,
                reason: e.to_string(),
            })?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_jpeg, create_test_jpeg_with_orientation, noise_image};
    use image::{ImageFormat, RgbaImage};

    #[test]
    fn decode_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let asset = RustBackend::new().decode(&path).unwrap();
        assert_eq!(asset.image.width(), 200);
        assert_eq!(asset.image.height(), 150);
        assert_eq!(asset.original_bytes, std::fs::metadata(&path).unwrap().len());
        assert_eq!(asset.source, path);
    }

    #[test]
    fn decode_without_exif_has_no_orientation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        create_test_jpeg(&path, 32, 32);

        let asset = RustBackend::new().decode(&path).unwrap();
        assert_eq!(asset.orientation, None);
    }

    #[test]
    fn decode_reads_exif_orientation() {
        let tmp = tempfile::TempDir::new().unwrap();
        for tag in [3u16, 6, 8] {
            let path = tmp.path().join(format!("oriented-{tag}.jpg"));
            create_test_jpeg_with_orientation(&path, 60, 40, tag);

            let asset = RustBackend::new().decode(&path).unwrap();
            assert_eq!(asset.orientation, Some(OrientationTag(tag)));
            // Pixels are returned as stored; rotation is the corrector's job.
            assert_eq!((asset.image.width(), asset.image.height()), (60, 40));
        }
    }

    #[test]
    fn decode_nonexistent_file_errors() {
        let result = RustBackend::new().decode(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_garbage_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(RustBackend::new().decode(&path).is_err());
    }

    #[test]
    fn decode_png_with_alpha_normalises_to_rgb() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("alpha.png");
        RgbaImage::from_pixel(16, 8, image::Rgba([10, 20, 30, 128]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let asset = RustBackend::new().decode(&path).unwrap();
        assert!(matches!(asset.image, DynamicImage::ImageRgb8(_)));

        // And the normalised pixels encode cleanly.
        let bytes = RustBackend::new().encode(&asset.image, Quality::new(80)).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn decode_sniffs_content_not_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually-jpeg.png");
        create_test_jpeg(&path, 24, 12);

        let asset = RustBackend::new().decode(&path).unwrap();
        assert_eq!(asset.image.width(), 24);
    }

    #[test]
    fn encode_produces_jpeg_bytes() {
        let image = noise_image(64, 64);
        let bytes = RustBackend::new().encode(&image, Quality::new(90)).unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn encode_size_grows_with_quality() {
        let image = noise_image(96, 96);
        let backend = RustBackend::new();

        let low = backend.encode(&image, Quality::new(10)).unwrap().len();
        let high = backend.encode(&image, Quality::new(90)).unwrap().len();
        assert!(low < high, "q10={low} should be smaller than q90={high}");
    }

    #[test]
    fn encode_is_deterministic() {
        let image = noise_image(48, 48);
        let backend = RustBackend::new();

        let a = backend.encode(&image, Quality::new(70)).unwrap();
        let b = backend.encode(&image, Quality::new(70)).unwrap();
        assert_eq!(a, b);
    }
}
