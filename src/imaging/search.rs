//! Target-size quality search.
//!
//! [`encode_under_limit`] binary-searches the JPEG quality range
//! [`SEARCH_FLOOR`]..=[`SEARCH_CEILING`] for the highest quality whose encoded
//! output is no larger than a byte budget. It relies on encoded size being
//! non-decreasing in quality. When an encoder breaks that assumption the
//! result can be lower than optimal, but it is never over budget: a quality
//! is only accepted after its output was measured under the limit.
//!
//! Each probe is a full in-memory encode, so a search costs at most
//! `ceil(log2(96)) = 7` encodes plus one final encode of the winner.

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, SEARCH_CEILING, SEARCH_FLOOR};
use image::DynamicImage;
use tracing::{debug, warn};

/// One measured encode: the quality used and the bytes it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingAttempt {
    pub quality: Quality,
    pub bytes: Vec<u8>,
}

impl EncodingAttempt {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of a quality search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingOutcome {
    /// The highest acceptable quality and the bytes to persist.
    Fits(EncodingAttempt),
    /// Even the floor quality is over budget. `smallest_size` is the smallest
    /// output any probe produced.
    NoAcceptableQuality { smallest_size: u64 },
}

/// Find the highest quality whose JPEG output is at most `max_bytes`.
///
/// The winner is encoded once more after the search and those bytes are
/// returned, so what is written is exactly what was last measured. If that
/// final encode comes out over budget (a non-deterministic encoder), the
/// buffer measured during the search is used instead.
pub fn encode_under_limit(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    max_bytes: u64,
) -> Result<EncodingOutcome, BackendError> {
    let mut quality_min = SEARCH_FLOOR;
    let mut quality_max = SEARCH_CEILING;
    let mut best: Option<EncodingAttempt> = None;
    let mut smallest_size = u64::MAX;

    while quality_min <= quality_max {
        let mid = Quality::new((quality_min + quality_max) / 2);
        let bytes = backend.encode(image, mid)?;
        let size = bytes.len() as u64;
        smallest_size = smallest_size.min(size);

        if size <= max_bytes {
            debug!(quality = mid.value(), size, max_bytes, "probe fits");
            best = Some(EncodingAttempt { quality: mid, bytes });
            quality_min = mid.value() + 1;
        } else {
            debug!(quality = mid.value(), size, max_bytes, "probe over budget");
            // mid >= 1, so this bottoms out at 0 and ends the loop.
            quality_max = mid.value() - 1;
        }
    }

    let Some(measured) = best else {
        return Ok(EncodingOutcome::NoAcceptableQuality { smallest_size });
    };

    let bytes = backend.encode(image, measured.quality)?;
    if bytes.len() as u64 > max_bytes {
        warn!(
            quality = measured.quality.value(),
            final_size = bytes.len(),
            measured_size = measured.size(),
            "final encode exceeded the budget, keeping the measured buffer"
        );
        return Ok(EncodingOutcome::Fits(measured));
    }

    Ok(EncodingOutcome::Fits(EncodingAttempt {
        quality: measured.quality,
        bytes,
    }))
}
