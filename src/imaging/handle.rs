//! The caller-facing image handle.
//!
//! ```text
//!   Image::new ──ok──▶ Validated ──close()/drop──▶ Released
//!        │                 │ thumbnail / crop          │ thumbnail / crop
//!        └──err (nothing   ▼ (state unchanged)         ▼
//!           retained)    bytes                    Err(Closed)
//! ```
//!
//! Construction runs the whole validation pipeline: sniff, header, orientation,
//! admission, and only then a full decode. A failed construction leaves no
//! buffer behind. The decoded buffer is released exactly once, by [`close`]
//! or by `Drop`, whichever comes first; `Drop` is the scope guard, so the
//! buffer is freed even when a caller bails out early with `?`.
//!
//! One handle is meant for one thread of work at a time. Separate handles
//! share nothing and can be driven in parallel.
//!
//! [`close`]: Image::close

use super::admission::{Limits, admit};
use super::backend::{Dimensions, ImageBackend};
use super::error::ImageError;
use super::format::{FormatPolicy, FormatTag};
use super::operations::{self, SourceImage};
use super::orientation::{Transform, normalize};
use super::params::{CropRequest, EncodeParams, ThumbnailRequest};
use super::rust_backend::RustBackend;

/// Everything that shapes validation and output, beyond the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub limits: Limits,
    pub policy: FormatPolicy,
    pub encode: EncodeParams,
}

impl ImageOptions {
    pub fn new(max_buffer_pixels: u64) -> Self {
        Self {
            limits: Limits::new(max_buffer_pixels),
            policy: FormatPolicy::default(),
            encode: EncodeParams::default(),
        }
    }
}

enum State<Buffer> {
    Validated(Buffer),
    Released,
}

/// A validated, decoded image.
pub struct Image<B: ImageBackend = RustBackend> {
    backend: B,
    state: State<B::Buffer>,
    display: Dimensions,
    transform: Transform,
    input_format: FormatTag,
    output_format: FormatTag,
    encode: EncodeParams,
}

impl Image<RustBackend> {
    /// Validate and decode `bytes`, refusing more than `max_buffer_pixels`.
    pub fn new(bytes: &[u8], max_buffer_pixels: u64) -> Result<Self, ImageError> {
        Self::with_options(bytes, &ImageOptions::new(max_buffer_pixels))
    }

    pub fn with_options(bytes: &[u8], options: &ImageOptions) -> Result<Self, ImageError> {
        Self::with_backend(RustBackend::new(), bytes, options)
    }
}

impl<B: ImageBackend> Image<B> {
    /// Validate and decode `bytes` with an explicit codec backend.
    pub fn with_backend(
        backend: B,
        bytes: &[u8],
        options: &ImageOptions,
    ) -> Result<Self, ImageError> {
        let sniffed = backend.sniff(bytes);
        if !sniffed.is_known() {
            log::debug!("no supported signature in {} bytes", bytes.len());
            return Err(ImageError::UnknownFormat);
        }

        let header = backend.decode_header(bytes).map_err(ImageError::from_decode)?;
        let (display, transform) = normalize(header.raw, header.orientation);
        log::debug!(
            "{} header: raw {}x{}, orientation {}, display {}x{}",
            sniffed,
            header.raw.width,
            header.raw.height,
            header.orientation,
            display.width,
            display.height
        );

        admit(display, &options.limits)?;

        let output_format = options
            .policy
            .decide(sniffed, header.has_alpha, header.indexed);

        let buffer = backend
            .decode_full(bytes, &options.limits)
            .map_err(ImageError::from_decode)?;

        let decoded = backend.dimensions(&buffer);
        if decoded != header.raw {
            log::debug!(
                "decoded {}x{} disagrees with header {}x{}",
                decoded.width,
                decoded.height,
                header.raw.width,
                header.raw.height
            );
            backend.release(buffer);
            return Err(ImageError::UnknownFormat);
        }

        Ok(Self {
            backend,
            state: State::Validated(buffer),
            display,
            transform,
            input_format: sniffed,
            output_format,
            encode: options.encode,
        })
    }

    /// Display width (after orientation).
    pub fn width(&self) -> u32 {
        self.display.width
    }

    /// Display height (after orientation).
    pub fn height(&self) -> u32 {
        self.display.height
    }

    pub fn dimensions(&self) -> Dimensions {
        self.display
    }

    pub fn input_format(&self) -> FormatTag {
        self.input_format
    }

    /// Format every derivative of this image is written in.
    pub fn output_format(&self) -> FormatTag {
        self.output_format
    }

    /// Transform applied to the stored pixels to display them upright.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Released)
    }

    fn source(&self) -> Result<SourceImage<'_, B>, ImageError> {
        match &self.state {
            State::Validated(buffer) => Ok(SourceImage {
                buffer,
                display: self.display,
                transform: self.transform,
                output: self.output_format,
                params: self.encode,
            }),
            State::Released => Err(ImageError::Closed),
        }
    }

    /// Scale into a `max_width` x `max_height` box without upscaling.
    ///
    /// With `fit_inside` the result fits the box on both axes; otherwise one
    /// axis matches the box and the other may overflow it.
    pub fn thumbnail(
        &self,
        max_width: u32,
        max_height: u32,
        fit_inside: bool,
    ) -> Result<Vec<u8>, ImageError> {
        let request = ThumbnailRequest {
            max_width,
            max_height,
            fit_inside,
        };
        operations::render_thumbnail(&self.backend, &self.source()?, &request)
    }

    /// Centered crop of exactly `width` x `height`, shrunk to the requested
    /// aspect ratio when larger than the image.
    pub fn crop(&self, width: u32, height: u32) -> Result<Vec<u8>, ImageError> {
        let request = CropRequest {
            target_width: width,
            target_height: height,
        };
        operations::render_crop(&self.backend, &self.source()?, &request)
    }

    /// Release the decoded buffer. Safe to call any number of times.
    pub fn close(&mut self) {
        if let State::Validated(buffer) = std::mem::replace(&mut self.state, State::Released) {
            self.backend.release(buffer);
        }
    }
}

impl<B: ImageBackend> Drop for Image<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: ImageBackend> std::fmt::Debug for Image<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.display.width)
            .field("height", &self.display.height)
            .field("input_format", &self.input_format)
            .field("output_format", &self.output_format)
            .field("closed", &self.is_closed())
            .finish()
    }
}
