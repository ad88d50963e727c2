//! Parameter types for encoding and orientation.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality level (1-100), clamped on construction.
//! - [`OrientationTag`]: raw EXIF orientation value (tag `0x0112`) read from the source.
//!
//! The quality search only ever probes [`SEARCH_FLOOR`]..=[`SEARCH_CEILING`];
//! values above 96 buy very little fidelity for a lot of bytes.

use serde::Serialize;

/// Lowest quality the size search will try.
pub const SEARCH_FLOOR: u8 = 1;

/// Highest quality the size search will try.
pub const SEARCH_CEILING: u8 = 96;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// EXIF orientation value as stored in the file.
///
/// Only 3, 6 and 8 change the pixels (see
/// [`orientation::correct`](super::orientation::correct)); mirrored variants
/// (2, 4, 5, 7) and out-of-range values are carried but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationTag(pub u16);

impl OrientationTag {
    pub fn value(self) -> u16 {
        self.0
    }
}

impl From<image::metadata::Orientation> for OrientationTag {
    fn from(orientation: image::metadata::Orientation) -> Self {
        use image::metadata::Orientation;
        let tag = match orientation {
            Orientation::NoTransforms => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::FlipVertical => 4,
            Orientation::Rotate90FlipH => 5,
            Orientation::Rotate90 => 6,
            Orientation::Rotate270FlipH => 7,
            Orientation::Rotate270 => 8,
        };
        Self(tag)
    }
}
