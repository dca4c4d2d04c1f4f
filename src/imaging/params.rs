//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the caller-facing [`Image`](super::Image), the
//! [`operations`](super::operations) module (which turns a request into
//! geometry), and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ThumbnailRequest`]: Bounding box plus fit-inside / fill mode.
//! - [`CropRequest`]: Exact target size. When too big, shrunk to fit while keeping the
//!   requested aspect ratio.
//! - [`EncodeParams`]: Encoder settings passed through to the backend.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// A thumbnail request: scale into a `max_width` x `max_height` box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub max_width: u32,
    pub max_height: u32,
    /// `true`: fit entirely inside the box. `false`: fill one side.
    pub fit_inside: bool,
}

impl ThumbnailRequest {
    pub fn fit(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            fit_inside: true,
        }
    }

    pub fn fill(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            fit_inside: false,
        }
    }
}

/// A crop request for an exact output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRequest {
    pub target_width: u32,
    pub target_height: u32,
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    /// Only used by lossy formats.
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
        assert_eq!(EncodeParams::default().quality.value(), 90);
    }

    #[test]
    fn thumbnail_request_constructors() {
        assert!(ThumbnailRequest::fit(10, 20).fit_inside);
        assert!(!ThumbnailRequest::fill(10, 20).fit_inside);
        assert_eq!(ThumbnailRequest::fill(10, 20).max_height, 20);
    }
}
