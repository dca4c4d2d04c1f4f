//! Admission control on header-derived display dimensions.
//!
//! Runs before any pixel buffer exists. A small file declaring a huge canvas
//! (a decompression bomb) is stopped here on the strength of its header alone.

use super::backend::Dimensions;
use super::error::ImageError;

/// Smallest accepted display side. 1×1 uploads are tracking pixels or
/// malformed files, never content.
pub const MIN_SIDE: u32 = 2;

/// Default bound on a single display side.
pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

/// Resource bounds enforced before full decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum `width * height` of the decoded buffer.
    pub max_buffer_pixels: u64,
    /// Maximum length of either display side.
    pub max_dimension: u32,
}

impl Limits {
    pub fn new(max_buffer_pixels: u64) -> Self {
        Self {
            max_buffer_pixels,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(self, max_dimension: u32) -> Self {
        Self {
            max_dimension,
            ..self
        }
    }
}

/// Admit or reject an image by its display dimensions.
///
/// Degenerate sizes are format errors; everything over a bound is `TooBig`.
pub fn admit(display: Dimensions, limits: &Limits) -> Result<(), ImageError> {
    if display.width < MIN_SIDE || display.height < MIN_SIDE {
        log::debug!(
            "rejecting degenerate {}x{} image",
            display.width,
            display.height
        );
        return Err(ImageError::UnknownFormat);
    }

    let pixels = display.pixels();
    if display.width > limits.max_dimension || display.height > limits.max_dimension {
        log::debug!(
            "rejecting {}x{}: side exceeds {}",
            display.width,
            display.height,
            limits.max_dimension
        );
        return Err(ImageError::TooBig {
            pixels,
            budget: limits.max_buffer_pixels,
        });
    }

    if pixels > limits.max_buffer_pixels {
        log::debug!(
            "rejecting {}x{}: {} pixels over budget {}",
            display.width,
            display.height,
            pixels,
            limits.max_buffer_pixels
        );
        return Err(ImageError::TooBig {
            pixels,
            budget: limits.max_buffer_pixels,
        });
    }

    Ok(())
}
