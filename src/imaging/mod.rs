//! Image processing on top of the `image` crate, no external tools.
//!
//! | Operation | Where |
//! |---|---|
//! | **Decode + orientation tag** | [`ImageBackend::decode`] |
//! | **Orientation correction** | [`orientation::correct`] |
//! | **JPEG encode at a quality** | [`ImageBackend::encode`] |
//! | **Size-bounded quality search** | [`search::encode_under_limit`] |
//!
//! The module is split into:
//! - **Parameters**: `Quality`, search bounds, `OrientationTag`
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Orientation** and **Search**: backend-agnostic logic on top

pub mod backend;
pub mod orientation;
mod params;
pub mod rust_backend;
pub mod search;

pub use backend::{BackendError, ImageAsset, ImageBackend};
pub use params::{OrientationTag, Quality, SEARCH_CEILING, SEARCH_FLOOR};
pub use rust_backend::RustBackend;
pub use search::{EncodingAttempt, EncodingOutcome, encode_under_limit};
