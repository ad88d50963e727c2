//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns display lines, so output can
//! be asserted in tests without capturing stdout. The `print_*` wrappers write
//! those lines to stdout. Log lines from `tracing` go to stderr and never mix
//! with these.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! 3 photos in photos/
//!     001 IMG_0001.jpg
//!     002 IMG_0002.jpg
//!     003 scan.PNG
//! ```
//!
//! ## Reduce
//!
//! ```text
//! Converting file: photos/IMG_0001.jpg...
//! [1/3]  33%
//! Converting file: photos/IMG_0002.jpg...
//! ERROR: No acceptable quality factor found for IMG_0002.jpg
//! [2/3]  67%
//! ...
//! Done!
//!
//! Reduced 2 of 3 photos into photos/reduced_photos
//!     Written: 2 (1.9 MiB from 14.2 MiB)
//!     Skipped, no quality fits: 1
//!         IMG_0002.jpg (smallest 1.1 MiB)
//!     Skipped, unreadable: 0
//! ```

use crate::process::{BatchSummary, FileStatus, ProgressEvent};
use std::path::{Path, PathBuf};

/// Human-readable byte count in binary units.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the eligible photo listing of a directory.
pub fn format_scan_output(source: &Path, photos: &[PathBuf]) -> Vec<String> {
    let noun = if photos.len() == 1 { "photo" } else { "photos" };
    let mut lines = vec![format!("{} {} in {}", photos.len(), noun, source.display())];
    lines.extend(
        photos
            .iter()
            .enumerate()
            .map(|(i, p)| format!("    {:03} {}", i + 1, file_name(p))),
    );
    lines
}

pub fn print_scan_output(source: &Path, photos: &[PathBuf]) {
    for line in format_scan_output(source, photos) {
        println!("{}", line);
    }
}

// ============================================================================
// Reduce output
// ============================================================================

/// Format a progress notification as display lines.
///
/// Status messages are shown verbatim; progress becomes a counter with the
/// percentage of attempted files.
pub fn format_progress_event(event: &ProgressEvent) -> Vec<String> {
    match event {
        ProgressEvent::Status(message) => vec![message.clone()],
        ProgressEvent::Progress { current, total } => {
            let percent = if *total == 0 {
                100
            } else {
                current * 100 / total
            };
            vec![format!("[{}/{}] {:>3}%", current, total, percent)]
        }
    }
}

/// Format the end-of-batch summary.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = Vec::new();

    if summary.cancelled {
        lines.push(format!(
            "Cancelled after {} of {} photos",
            summary.attempted(),
            summary.total
        ));
    }
    lines.push(format!(
        "Reduced {} of {} photos into {}",
        summary.written(),
        summary.total,
        summary.destination_dir.display()
    ));

    let original: u64 = summary
        .files
        .iter()
        .map(|f| match f.status {
            FileStatus::Written { original_bytes, .. } => original_bytes,
            _ => 0,
        })
        .sum();
    lines.push(format!(
        "    Written: {} ({} from {})",
        summary.written(),
        format_bytes(summary.bytes_written()),
        format_bytes(original)
    ));

    lines.push(format!(
        "    Skipped, no quality fits: {}",
        summary.skipped_for_size()
    ));
    for file in &summary.files {
        if let FileStatus::NoAcceptableQuality { smallest_size } = file.status {
            lines.push(format!(
                "        {} (smallest {})",
                file_name(&file.source),
                format_bytes(smallest_size)
            ));
        }
    }

    lines.push(format!("    Skipped, unreadable: {}", summary.failed()));
    for file in &summary.files {
        match &file.status {
            FileStatus::DecodeFailed { reason } | FileStatus::EncodeFailed { reason } => {
                lines.push(format!("        {}: {}", file_name(&file.source), reason));
            }
            _ => {}
        }
    }

    lines
}

pub fn print_summary(summary: &BatchSummary) {
    println!();
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
