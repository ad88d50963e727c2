//! Orientation correction applied to decoded pixels before encoding.
//!
//! Only three orientation values rotate the canvas. They are expressed below
//! as counter-clockwise turns, the convention the mapping was first written in:
//!
//! | Tag | Counter-clockwise turn | `image` call |
//! |-----|------------------------|--------------|
//! | 3   | 180°                   | `rotate180` |
//! | 6   | 270° (= 90° clockwise) | `rotate90`  |
//! | 8   | 90°                    | `rotate270` |
//!
//! Every other value, including the mirrored orientations 2, 4, 5 and 7, and
//! a missing tag, leaves the image untouched. The output JPEG carries no EXIF,
//! so the rotation baked into the pixels is the only orientation a viewer sees.

use super::params::OrientationTag;
use image::DynamicImage;

/// Rotate `image` according to `tag`, expanding the canvas for quarter turns.
pub fn correct(image: DynamicImage, tag: Option<OrientationTag>) -> DynamicImage {
    match tag.map(OrientationTag::value) {
        Some(3) => image.rotate180(),
        Some(6) => image.rotate90(),
        Some(8) => image.rotate270(),
        _ => image,
    }
}

/// Whether [`correct`] would change the image for this tag.
pub fn rotates(tag: Option<OrientationTag>) -> bool {
    matches!(tag.map(OrientationTag::value), Some(3 | 6 | 8))
}
