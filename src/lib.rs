//! # Photo Reducer
//!
//! Shrinks every photo in a directory so that each one fits under a byte
//! budget, keeping as much JPEG quality as the budget allows. Reduced copies go
//! into a `reduced_photos/` directory next to the originals, under the same
//! file names.
//!
//! # Pipeline
//!
//! Each eligible file goes through the same four steps:
//!
//! ```text
//! decode (+ EXIF orientation) → rotate upright → binary-search JPEG quality → write
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists eligible photos in a directory, grouped by extension |
//! | [`imaging`] | Decode, orientation correction, JPEG encode, quality search |
//! | [`process`] | Runs a batch: progress, skips, cancellation, summary |
//! | [`config`] | `photo-reducer.toml` loading, merging, validation, MiB conversion |
//! | [`output`] | CLI output formatting for scan listings, progress and summaries |
//!
//! # Design Decisions
//!
//! ## Quality Search Instead of Resizing
//!
//! Dimensions are never changed. The only lever is JPEG quality, searched in
//! 1..=96 with a binary search over in-memory encodes. Encoded size grows with
//! quality for practically every photo, so the search finds the best quality
//! in at most seven encodes. Quality is capped at 96 because higher settings
//! grow files sharply for no visible gain.
//!
//! ## Orientation Baked Into Pixels
//!
//! Output files carry no EXIF, so tags 3, 6 and 8 are applied to the pixels
//! before encoding. Mirrored orientations are left alone. See
//! [`imaging::orientation`].
//!
//! ## Names Are Kept, Formats Are Not
//!
//! Every output is JPEG data, but it keeps the source file name, extension
//! included. `scan.png` becomes a JPEG file called `scan.png`. Tools that sniff
//! content handle this fine; tools that trust extensions may not.
//!
//! ## Skips Are Data, Filesystem Failures Are Errors
//!
//! A photo that cannot fit the budget, or cannot be decoded, is recorded in
//! the [`process::BatchSummary`] and the batch continues. Failing to create the
//! output directory or to write a file stops the batch with an error.

pub mod config;
pub mod imaging;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
