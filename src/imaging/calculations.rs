//! Pure calculation functions for thumbnail and crop geometry.
//!
//! All functions here are pure and testable without any I/O or images. Inputs
//! are display dimensions (orientation already applied).
//!
//! Scale comparisons are done by cross-multiplying in `u64` rather than by
//! comparing float ratios, and the one dependent axis is derived from the
//! governing axis as `other * bound / governing`. That keeps results exact
//! for cases like 1500 * 398 / 2000 = 298.5, which must round up to 299.

use super::backend::Dimensions;

/// Output of [`crop_rect`]: size and top-left offset within the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Round-half-up of `value * numerator / denominator`, at least 1.
fn scale_axis(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (value as f64 * numerator as f64 / denominator as f64).round();
    (scaled as u32).max(1)
}

/// Calculate thumbnail dimensions for a box.
///
/// # Arguments
/// * `source` - Display dimensions of the source
/// * `max_width`, `max_height` - The bounding box
/// * `fit_inside` - `true` scales by the smaller ratio (whole image inside the
///   box); `false` scales by the larger ratio (one axis fills the box, the
///   other may overflow it)
///
/// Never upscales: when the governing ratio is at least 1 the source size is
/// returned unchanged. Zero bounds are treated as 1.
///
/// # Examples
/// ```
/// # use imager::imaging::{Dimensions, thumbnail_dimensions};
/// let src = Dimensions { width: 398, height: 536 };
/// assert_eq!(thumbnail_dimensions(src, 200, 300, true), Dimensions { width: 200, height: 269 });
/// assert_eq!(thumbnail_dimensions(src, 200, 300, false), Dimensions { width: 223, height: 300 });
/// ```
pub fn thumbnail_dimensions(
    source: Dimensions,
    max_width: u32,
    max_height: u32,
    fit_inside: bool,
) -> Dimensions {
    let (src_w, src_h) = (source.width.max(1), source.height.max(1));
    let (max_w, max_h) = (max_width.max(1), max_height.max(1));

    // scale_w < scale_h  <=>  max_w / src_w < max_h / src_h
    let width_ratio_smaller = (max_w as u64) * (src_h as u64) < (max_h as u64) * (src_w as u64);
    let width_governs = width_ratio_smaller == fit_inside;

    if width_governs {
        if max_w >= src_w {
            return source;
        }
        Dimensions {
            width: max_w,
            height: scale_axis(src_h, max_w, src_w),
        }
    } else {
        if max_h >= src_h {
            return source;
        }
        Dimensions {
            width: scale_axis(src_w, max_h, src_h),
            height: max_h,
        }
    }
}

/// Calculate a centered crop for a requested size.
///
/// A request that fits inside the source is honored exactly. A request that
/// exceeds the source on either axis is shrunk to the largest rectangle with
/// the requested aspect ratio that fits, so the crop never upscales.
///
/// # Examples
/// ```
/// # use imager::imaging::{Dimensions, crop_rect};
/// let src = Dimensions { width: 398, height: 536 };
/// let rect = crop_rect(src, 2000, 1500);
/// assert_eq!((rect.width, rect.height), (398, 299));
/// ```
pub fn crop_rect(source: Dimensions, target_width: u32, target_height: u32) -> CropRect {
    let (src_w, src_h) = (source.width.max(1), source.height.max(1));
    let (tgt_w, tgt_h) = (target_width.max(1), target_height.max(1));

    let (width, height) = if tgt_w <= src_w && tgt_h <= src_h {
        (tgt_w, tgt_h)
    } else if (src_w as u64) * (tgt_h as u64) <= (src_h as u64) * (tgt_w as u64) {
        // src_w / tgt_w is the smaller scale: width fills the source
        (src_w, scale_axis(tgt_h, src_w, tgt_w).min(src_h))
    } else {
        (scale_axis(tgt_w, src_h, tgt_h).min(src_w), src_h)
    };

    CropRect {
        width,
        height,
        x: (src_w - width) / 2,
        y: (src_h - height) / 2,
    }
}
