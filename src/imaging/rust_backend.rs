//! Pure Rust codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff | `infer` signature matchers |
//! | Header (size, color, EXIF orientation) | `image::ImageReader::into_decoder` + `ImageDecoder` |
//! | Decode (JPEG, PNG, GIF first frame) | `image` crate decoders under `image::Limits` |
//! | Orient | `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Encode → JPEG / PNG / GIF | `JpegEncoder`, `PngEncoder`, `DynamicImage::write_to` |
//!
//! Only the `jpeg`, `png`, and `gif` features of `image` are compiled in, so
//! no other decoder is reachable from untrusted bytes.

use super::admission::Limits;
use super::backend::{BackendError, Dimensions, HeaderInfo, ImageBackend};
use super::format::{self, FormatTag};
use super::orientation::Transform;
use super::params::EncodeParams;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation as ExifOrientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// Bytes per pixel of the widest buffer a supported decoder produces (RGBA16).
const MAX_BYTES_PER_PIXEL: u64 = 8;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn image_format(tag: FormatTag) -> Result<ImageFormat, BackendError> {
    match tag {
        FormatTag::Jpeg => Ok(ImageFormat::Jpeg),
        FormatTag::Png => Ok(ImageFormat::Png),
        FormatTag::Gif => Ok(ImageFormat::Gif),
        FormatTag::Unknown => Err(BackendError::Unsupported),
    }
}

/// A reader pinned to the sniffed format; content is never re-guessed.
fn reader(bytes: &[u8]) -> Result<(FormatTag, ImageReader<Cursor<&[u8]>>), BackendError> {
    let tag = format::sniff(bytes);
    let reader = ImageReader::with_format(Cursor::new(bytes), image_format(tag)?);
    Ok((tag, reader))
}

/// Decoder allocation limits matching what admission allowed.
fn decoder_limits(limits: &Limits) -> image::Limits {
    let mut decoder_limits = image::Limits::default();
    decoder_limits.max_image_width = Some(limits.max_dimension);
    decoder_limits.max_image_height = Some(limits.max_dimension);
    decoder_limits.max_alloc = Some(
        limits
            .max_buffer_pixels
            .saturating_mul(MAX_BYTES_PER_PIXEL),
    );
    decoder_limits
}

impl ImageBackend for RustBackend {
    type Buffer = DynamicImage;

    fn sniff(&self, bytes: &[u8]) -> FormatTag {
        format::sniff(bytes)
    }

    fn decode_header(&self, bytes: &[u8]) -> Result<HeaderInfo, BackendError> {
        let (tag, reader) = reader(bytes)?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(format!("Failed to read header: {e}")))?;

        let (width, height) = decoder.dimensions();
        let has_alpha = decoder.color_type().has_alpha();
        let orientation = decoder
            .orientation()
            .unwrap_or(ExifOrientation::NoTransforms)
            .to_exif();
        let indexed = match tag {
            FormatTag::Png => format::png_is_indexed(bytes),
            FormatTag::Gif => true,
            _ => false,
        };

        Ok(HeaderInfo {
            format: tag,
            raw: Dimensions { width, height },
            orientation,
            has_alpha,
            indexed,
        })
    }

    fn decode_full(&self, bytes: &[u8], limits: &Limits) -> Result<DynamicImage, BackendError> {
        let (_, mut reader) = reader(bytes)?;
        reader.limits(decoder_limits(limits));
        reader
            .decode()
            .map_err(|e| BackendError::Decode(format!("Failed to decode: {e}")))
    }

    fn dimensions(&self, buffer: &DynamicImage) -> Dimensions {
        Dimensions {
            width: buffer.width(),
            height: buffer.height(),
        }
    }

    fn orient(
        &self,
        buffer: &DynamicImage,
        transform: Transform,
    ) -> Result<DynamicImage, BackendError> {
        let orientation = ExifOrientation::from_exif(transform.exif_code())
            .unwrap_or(ExifOrientation::NoTransforms);
        let mut upright = buffer.clone();
        upright.apply_orientation(orientation);
        Ok(upright)
    }

    fn resize(
        &self,
        buffer: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Invalid resize target {width}x{height}"
            )));
        }
        Ok(buffer.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn crop(
        &self,
        buffer: &DynamicImage,
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    ) -> Result<DynamicImage, BackendError> {
        let fits_x = x.checked_add(width).is_some_and(|r| r <= buffer.width());
        let fits_y = y.checked_add(height).is_some_and(|b| b <= buffer.height());
        if !fits_x || !fits_y || width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop {width}x{height}+{x}+{y} outside {}x{}",
                buffer.width(),
                buffer.height()
            )));
        }
        Ok(buffer.crop_imm(x, y, width, height))
    }

    fn encode(
        &self,
        buffer: &DynamicImage,
        format: FormatTag,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::new();
        match format {
            FormatTag::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(buffer.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut out, params.quality.value() as u8);
                rgb.write_with_encoder(encoder)
            }
            FormatTag::Png => buffer.write_with_encoder(PngEncoder::new(&mut out)),
            FormatTag::Gif => DynamicImage::ImageRgba8(buffer.to_rgba8())
                .write_to(&mut Cursor::new(&mut out), ImageFormat::Gif),
            FormatTag::Unknown => return Err(BackendError::Unsupported),
        }
        .map_err(|e| BackendError::Encode(format!("{format} encode failed: {e}")))?;
        Ok(out)
    }
}
