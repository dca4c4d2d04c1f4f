//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Identify
//!
//! ```text
//! upload.jpg
//!     Format: JPEG → JPEG
//!     Size: 398x536 (213328 pixels)
//!     Orientation: rotate 90°
//! ```
//!
//! ## Thumbnail / Crop
//!
//! ```text
//! upload.jpg → thumb.jpg (200x269 JPEG, 14.2 KB)
//! ```
//!
//! ## Batch
//!
//! ```text
//! dawn.jpg → dawn.jpg (200x134)
//! huge.png: rejected (image too big: 40000000 pixels (budget 10000000))
//!
//! Wrote 1 thumbnail, rejected 1 file
//! ```

use crate::batch::{BatchOutcome, BatchReport};
use crate::imaging::orientation::Rotation;
use crate::imaging::{Dimensions, FormatTag, Image, ImageBackend, Transform};
use serde::Serialize;
use std::path::Path;

/// Machine-readable summary of a validated image, printed by `identify --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifyReport {
    pub path: String,
    pub input_format: FormatTag,
    pub output_format: FormatTag,
    pub width: u32,
    pub height: u32,
    pub pixels: u64,
    /// EXIF orientation code that maps stored pixels to the reported size.
    pub orientation: u8,
}

impl IdentifyReport {
    pub fn new<B: ImageBackend>(path: &Path, image: &Image<B>) -> Self {
        let Dimensions { width, height } = image.dimensions();
        Self {
            path: path.display().to_string(),
            input_format: image.input_format(),
            output_format: image.output_format(),
            width,
            height,
            pixels: image.dimensions().pixels(),
            orientation: image.transform().exif_code(),
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
fn format_bytes(len: usize) -> String {
    match len {
        n if n < 1024 => format!("{} B", n),
        n if n < 1024 * 1024 => format!("{:.1} KB", n as f64 / 1024.0),
        n => format!("{:.1} MB", n as f64 / (1024.0 * 1024.0)),
    }
}

fn describe_transform(transform: Transform) -> String {
    if transform.is_identity() {
        return "upright".to_string();
    }
    let degrees = match transform.rotation {
        Rotation::R0 => 0,
        Rotation::R90 => 90,
        Rotation::R180 => 180,
        Rotation::R270 => 270,
    };
    match (degrees, transform.flip_horizontal) {
        (0, true) => "mirror".to_string(),
        (d, true) => format!("rotate {}° + mirror", d),
        (d, false) => format!("rotate {}°", d),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// identify
// ============================================================================

pub fn format_identify_output(report: &IdentifyReport, transform: Transform) -> Vec<String> {
    vec![
        report.path.clone(),
        format!(
            "{}Format: {} → {}",
            indent(1),
            report.input_format,
            report.output_format
        ),
        format!(
            "{}Size: {}x{} ({} pixels)",
            indent(1),
            report.width,
            report.height,
            report.pixels
        ),
        format!("{}Orientation: {}", indent(1), describe_transform(transform)),
    ]
}

pub fn print_identify_output(report: &IdentifyReport, transform: Transform) {
    for line in format_identify_output(report, transform) {
        println!("{}", line);
    }
}

// ============================================================================
// thumbnail / crop
// ============================================================================

pub fn format_derived_line(
    source: &Path,
    output: &Path,
    size: Dimensions,
    format: FormatTag,
    len: usize,
) -> String {
    format!(
        "{} → {} ({}x{} {}, {})",
        source.display(),
        output.display(),
        size.width,
        size.height,
        format,
        format_bytes(len)
    )
}

// ============================================================================
// batch
// ============================================================================

/// Format batch output. Paths are shown relative to the input and output roots.
pub fn format_batch_output(report: &BatchReport, dir: &Path, out_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in &report.outcomes {
        let source = outcome.source().strip_prefix(dir).unwrap_or(outcome.source());
        match outcome {
            BatchOutcome::Written {
                output,
                width,
                height,
                ..
            } => {
                let output = output.strip_prefix(out_dir).unwrap_or(output);
                lines.push(format!(
                    "{} → {} ({}x{})",
                    source.display(),
                    output.display(),
                    width,
                    height
                ));
            }
            BatchOutcome::Rejected { reason, .. } => {
                lines.push(format!("{}: rejected ({})", source.display(), reason));
            }
        }
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Wrote {}, rejected {}",
        plural(report.written(), "thumbnail"),
        plural(report.rejected(), "file")
    ));
    lines
}

pub fn print_batch_output(report: &BatchReport, dir: &Path, out_dir: &Path) {
    for line in format_batch_output(report, dir, out_dir) {
        println!("{}", line);
    }
}
