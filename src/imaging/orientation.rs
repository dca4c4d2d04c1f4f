//! EXIF orientation normalization.
//!
//! Orientation is consumed exactly once, when an [`Image`](super::Image) is
//! validated: the raw header size becomes the display size reported to
//! callers, and the matching [`Transform`] is stored for every later
//! derivation. Nothing re-reads the metadata afterwards, so reported size and
//! applied transform cannot drift apart.
//!
//! ```text
//!     1: identity    2: flip H      3: rotate 180  4: flip V
//!     5: transpose   6: rotate 90   7: transverse  8: rotate 270
//! ```
//!
//! Codes 5–8 swap width and height.

use super::backend::Dimensions;

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

/// Pixel transform that brings the stored buffer upright.
///
/// Rotation is applied first, then the optional horizontal flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform {
    pub rotation: Rotation,
    pub flip_horizontal: bool,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Rotation::R0,
        flip_horizontal: false,
    };

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// Whether applying this transform exchanges the axes.
    pub fn swaps_axes(self) -> bool {
        matches!(self.rotation, Rotation::R90 | Rotation::R270)
    }

    /// EXIF orientation code (1–8) describing the same transform.
    pub fn exif_code(self) -> u8 {
        Orientation::ALL
            .iter()
            .position(|o| o.transform() == self)
            .map(|i| i as u8 + 1)
            .unwrap_or(1)
    }
}

/// EXIF orientation tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Identity,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    const ALL: [Self; 8] = [
        Self::Identity,
        Self::FlipHorizontal,
        Self::Rotate180,
        Self::FlipVertical,
        Self::Transpose,
        Self::Rotate90,
        Self::Transverse,
        Self::Rotate270,
    ];

    /// Parse an EXIF code. Absent or out-of-range values mean identity.
    pub fn from_exif(code: u8) -> Self {
        match code {
            1..=8 => Self::ALL[(code - 1) as usize],
            _ => Self::Identity,
        }
    }

    pub fn transform(self) -> Transform {
        let (rotation, flip_horizontal) = match self {
            Self::Identity => (Rotation::R0, false),
            Self::FlipHorizontal => (Rotation::R0, true),
            Self::Rotate180 => (Rotation::R180, false),
            // flip V == rotate 180 then flip H
            Self::FlipVertical => (Rotation::R180, true),
            Self::Transpose => (Rotation::R90, true),
            Self::Rotate90 => (Rotation::R90, false),
            Self::Transverse => (Rotation::R270, true),
            Self::Rotate270 => (Rotation::R270, false),
        };
        Transform {
            rotation,
            flip_horizontal,
        }
    }
}

/// Display dimensions and the transform for a raw buffer.
pub fn normalize(raw: Dimensions, code: u8) -> (Dimensions, Transform) {
    let transform = Orientation::from_exif(code).transform();
    let display = if transform.swaps_axes() {
        Dimensions {
            width: raw.height,
            height: raw.width,
        }
    } else {
        raw
    };
    (display, transform)
}
