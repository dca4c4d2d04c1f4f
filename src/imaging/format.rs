//! Format sniffing and the input → output format table.
//!
//! Sniffing looks at signature bytes only. It never decodes, so it is safe to
//! run on anything a client uploads.
//!
//! The output table is decided once per [`Image`](super::Image) and stored:
//!
//! | Input | Output |
//! |---|---|
//! | JPEG | JPEG |
//! | PNG (truecolor / gray) | PNG |
//! | PNG (paletted) | [`FormatPolicy::indexed_png`] (JPEG by default) |
//! | GIF | [`FormatPolicy::gif`] (PNG by default) |
//!
//! With [`FormatPolicy::keep_alpha`], any JPEG choice for a source with
//! transparency is upgraded to PNG.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared format of an input, determined once from its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Jpeg,
    Png,
    Gif,
    Unknown,
}

impl FormatTag {
    /// File extension used when writing this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Unknown => "bin",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Unknown => "application/octet-stream",
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Unknown => "Unknown",
        })
    }
}

/// Identify the format from signature bytes.
pub fn sniff(bytes: &[u8]) -> FormatTag {
    if infer::image::is_jpeg(bytes) {
        FormatTag::Jpeg
    } else if infer::image::is_png(bytes) {
        FormatTag::Png
    } else if infer::image::is_gif(bytes) {
        FormatTag::Gif
    } else {
        FormatTag::Unknown
    }
}

/// Whether a PNG declares a palette (IHDR color type 3).
///
/// Reads the fixed-offset IHDR field; anything too short to hold one is
/// treated as not paletted and left for the decoder to reject.
pub fn png_is_indexed(bytes: &[u8]) -> bool {
    const COLOR_TYPE_OFFSET: usize = 8 + 4 + 4 + 4 + 4 + 1;
    const PALETTE: u8 = 3;
    bytes.get(12..16) == Some(b"IHDR".as_slice())
        && bytes.get(COLOR_TYPE_OFFSET) == Some(&PALETTE)
}

/// Policy for choosing the output format of derived images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatPolicy {
    /// Target for GIF sources.
    pub gif: FormatTag,
    /// Target for paletted PNG sources.
    pub indexed_png: FormatTag,
    /// Never choose JPEG for a source that carries transparency.
    pub keep_alpha: bool,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            gif: FormatTag::Png,
            indexed_png: FormatTag::Jpeg,
            keep_alpha: true,
        }
    }
}

impl FormatPolicy {
    /// Pick the output format for a source.
    ///
    /// `Unknown` inputs are rejected before this is consulted; they map to
    /// themselves so the caller still sees an unusable result.
    pub fn decide(&self, input: FormatTag, has_alpha: bool, indexed: bool) -> FormatTag {
        let chosen = match input {
            FormatTag::Jpeg => FormatTag::Jpeg,
            FormatTag::Png if indexed => self.indexed_png,
            FormatTag::Png => FormatTag::Png,
            FormatTag::Gif => self.gif,
            FormatTag::Unknown => return FormatTag::Unknown,
        };
        if self.keep_alpha && has_alpha && chosen == FormatTag::Jpeg {
            FormatTag::Png
        } else {
            chosen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn png_header(color_type: u8) -> Vec<u8> {
        let mut bytes = PNG_SIG.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.push(8);
        bytes.push(color_type);
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes
    }

    // =========================================================================
    // sniff
    // =========================================================================

    #[test]
    fn sniff_recognizes_supported_signatures() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), FormatTag::Jpeg);
        assert_eq!(sniff(PNG_SIG), FormatTag::Png);
        assert_eq!(sniff(b"GIF89a\x02\x00"), FormatTag::Gif);
        assert_eq!(sniff(b"GIF87a\x02\x00"), FormatTag::Gif);
    }

    #[test]
    fn sniff_rejects_text_and_empty() {
        assert_eq!(sniff(b"this is not an image\n"), FormatTag::Unknown);
        assert_eq!(sniff(&[]), FormatTag::Unknown);
    }

    #[test]
    fn sniff_rejects_other_image_formats() {
        // BMP decodes fine elsewhere but is not admitted here.
        assert_eq!(sniff(b"BM\x36\x00\x00\x00\x00\x00"), FormatTag::Unknown);
    }

    #[test]
    fn png_palette_detection() {
        assert!(png_is_indexed(&png_header(3)));
        assert!(!png_is_indexed(&png_header(2)));
        assert!(!png_is_indexed(&png_header(6)));
        assert!(!png_is_indexed(PNG_SIG));
    }

    // =========================================================================
    // FormatPolicy
    // =========================================================================

    #[test]
    fn default_policy_table() {
        let policy = FormatPolicy::default();
        assert_eq!(policy.decide(FormatTag::Jpeg, false, false), FormatTag::Jpeg);
        assert_eq!(policy.decide(FormatTag::Png, false, false), FormatTag::Png);
        assert_eq!(policy.decide(FormatTag::Png, true, false), FormatTag::Png);
        assert_eq!(policy.decide(FormatTag::Png, false, true), FormatTag::Jpeg);
        assert_eq!(policy.decide(FormatTag::Gif, false, true), FormatTag::Png);
    }

    #[test]
    fn transparent_palette_png_stays_png() {
        let policy = FormatPolicy::default();
        assert_eq!(policy.decide(FormatTag::Png, true, true), FormatTag::Png);
    }

    #[test]
    fn keep_alpha_off_allows_jpeg() {
        let policy = FormatPolicy {
            keep_alpha: false,
            ..FormatPolicy::default()
        };
        assert_eq!(policy.decide(FormatTag::Png, true, true), FormatTag::Jpeg);
    }

    #[test]
    fn gif_target_is_configurable() {
        let policy = FormatPolicy {
            gif: FormatTag::Jpeg,
            ..FormatPolicy::default()
        };
        assert_eq!(policy.decide(FormatTag::Gif, false, true), FormatTag::Jpeg);
        assert_eq!(policy.decide(FormatTag::Gif, true, true), FormatTag::Png);
    }

    #[test]
    fn display_uses_upper_case_names() {
        assert_eq!(FormatTag::Jpeg.to_string(), "JPEG");
        assert_eq!(FormatTag::Png.to_string(), "PNG");
        assert_eq!(FormatTag::Gif.to_string(), "GIF");
    }
}
