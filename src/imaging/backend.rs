//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs:
//! decode a source file (pixels + orientation metadata) and encode pixels as
//! JPEG at a given quality into memory.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! [`MockBackend`](tests::MockBackend), whose encoded size is a pure function
//! of quality so search results can be asserted exactly.

use super::params::{OrientationTag, Quality};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("JPEG encode failed at quality {quality}: {reason}")]
    Encode { quality: Quality, reason: String },
}

/// A decoded source photo, owned by the pipeline step that decoded it.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub source: PathBuf,
    /// Size of the source file on disk.
    pub original_bytes: u64,
    pub image: DynamicImage,
    /// `None` when the file has no EXIF block or the block has no orientation entry.
    pub orientation: Option<OrientationTag>,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by the worker pool.
pub trait ImageBackend: Sync {
    /// Decode a file into pixels plus its orientation tag.
    fn decode(&self, path: &Path) -> Result<ImageAsset, BackendError>;

    /// Encode pixels as JPEG at `quality`, returning the full file bytes.
    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    type SizeFn = Box<dyn Fn(u8) -> usize + Send + Sync>;

    const JPEG_MAX_DIMENSION: u32 = 65_535;

    /// Mock backend that records operations and fabricates output buffers.
    ///
    /// The encoded length is `size_at(quality)`; the default model grows by
    /// 100 bytes per quality step on top of a 1000 byte floor. Files whose name
    /// contains `corrupt` fail to decode. Files whose name contains `wide`
    /// decode to a 70000x1 strip, which `encode` rejects like a real JPEG
    /// encoder would (dimensions above 65535).
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon.
    pub struct MockBackend {
        pub dimensions: (u32, u32),
        pub orientation: Option<OrientationTag>,
        size_at: SizeFn,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(String),
        Encode { quality: u8, width: u32, height: u32 },
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::with_sizes(|q| 1_000 + usize::from(q) * 100)
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_sizes(size_at: impl Fn(u8) -> usize + Send + Sync + 'static) -> Self {
            Self {
                dimensions: (40, 30),
                orientation: None,
                size_at: Box::new(size_at),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn with_orientation(mut self, tag: u16) -> Self {
            self.orientation = Some(OrientationTag(tag));
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Qualities passed to `encode`, in call order.
        pub fn encoded_qualities(&self) -> Vec<u8> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { quality, .. } => Some(quality),
                    RecordedOp::Decode(_) => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, path: &Path) -> Result<ImageAsset, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(path.to_string_lossy().to_string()));

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name.contains("corrupt") {
                return Err(BackendError::Decode {
                    path: path.to_path_buf(),
                    reason: "mock corrupt file".to_string(),
                });
            }

            let (w, h) = if name.contains("wide") {
                (70_000, 1)
            } else {
                self.dimensions
            };
            Ok(ImageAsset {
                source: path.to_path_buf(),
                original_bytes: 0,
                image: DynamicImage::new_rgb8(w, h),
                orientation: self.orientation,
            })
        }

        fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                quality: quality.value(),
                width: image.width(),
                height: image.height(),
            });
            if image.width() > JPEG_MAX_DIMENSION || image.height() > JPEG_MAX_DIMENSION {
                return Err(BackendError::Encode {
                    quality,
                    reason: "width and height must be <= 65535".to_string(),
                });
            }
            Ok(vec![0u8; (self.size_at)(quality.value())])
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::new().with_orientation(6);

        let asset = backend.decode(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(asset.image.width(), 40);
        assert_eq!(asset.image.height(), 30);
        assert_eq!(asset.orientation, Some(OrientationTag(6)));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Decode(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_fails_on_corrupt_names() {
        let backend = MockBackend::new();
        let result = backend.decode(Path::new("/test/corrupt.jpg"));
        assert!(matches!(result, Err(BackendError::Decode { .. })));
    }

    #[test]
    fn mock_rejects_oversized_encodes() {
        let backend = MockBackend::new();
        let asset = backend.decode(Path::new("/test/wide.png")).unwrap();
        assert_eq!(asset.image.width(), 70_000);

        let result = backend.encode(&asset.image, Quality::new(48));
        assert!(matches!(result, Err(BackendError::Encode { .. })));
    }

    #[test]
    fn mock_encode_size_follows_model() {
        let backend = MockBackend::with_sizes(|q| usize::from(q) * 10);
        let image = DynamicImage::new_rgb8(1, 1);

        let bytes = backend.encode(&image, Quality::new(42)).unwrap();
        assert_eq!(bytes.len(), 420);
        assert_eq!(backend.encoded_qualities(), vec![42]);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Encode {
                quality: 42,
                width: 1,
                height: 1
            }]
        );
    }
}
