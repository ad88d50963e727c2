//! Shared test utilities: synthetic photos written to disk or held in memory.
//!
//! Nothing here touches fixtures on disk; every test builds the images it
//! needs inside its own `TempDir`.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! create_test_jpeg_with_orientation(&tmp.path().join("side.jpg"), 60, 40, 6);
//! let image = noise_image(128, 96);
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder, RgbImage};
use std::path::Path;

/// Gradient RGB image, cheap to encode.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Deterministic pseudo-random RGB noise. Noise compresses poorly, so encoded
/// size rises steadily with quality.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let mut h = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        let [r, g, b, _] = h.to_le_bytes();
        image::Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

/// Write a gradient JPEG with no metadata.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, encode_jpeg(&gradient_image(width, height))).unwrap();
}

/// Write a gradient JPEG carrying an EXIF orientation tag.
///
/// The APP1 segment is spliced in right after SOI and holds a big-endian TIFF
/// header with a single IFD0 entry: tag 0x0112, SHORT, count 1.
pub fn create_test_jpeg_with_orientation(path: &Path, width: u32, height: u32, tag: u16) {
    let jpeg = encode_jpeg(&gradient_image(width, height));
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "encoder output must start with SOI");

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes()); // IFD0 offset
    tiff.extend_from_slice(&1u16.to_be_bytes()); // entry count
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&tag.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = u16::try_from(payload.len() + 2).unwrap();

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    std::fs::write(path, out).unwrap();
}

#[test]
fn orientation_segment_follows_soi() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("tagged.jpg");
    create_test_jpeg_with_orientation(&path, 8, 8, 6);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &[0xFF, 0xD8, 0xFF, 0xE1]);
    assert_eq!(&bytes[6..12], b"Exif\x00\x00");
}

#[test]
fn noise_is_deterministic() {
    assert_eq!(noise_image(16, 16), noise_image(16, 16));
}
