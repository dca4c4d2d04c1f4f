//! Derived-image building.
//!
//! These functions combine calculations with backend execution: compute the
//! geometry for a request, then drive the backend through
//! orient → resize/crop → encode. Planning is separate from rendering so the
//! geometry can be tested without a codec.
//!
//! Every intermediate buffer is held in a [`Scratch`] guard and handed back to
//! the backend when it goes out of scope, on success and on every error path.

use super::backend::{Dimensions, ImageBackend};
use super::calculations::{CropRect, crop_rect, thumbnail_dimensions};
use super::error::ImageError;
use super::format::FormatTag;
use super::orientation::Transform;
use super::params::{CropRequest, EncodeParams, ThumbnailRequest};
use std::ops::Deref;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// A validated source as seen by the builder.
pub struct SourceImage<'a, B: ImageBackend> {
    /// Decoded buffer as stored (not yet oriented).
    pub buffer: &'a B::Buffer,
    /// Size after orientation; all geometry is computed against this.
    pub display: Dimensions,
    pub transform: Transform,
    pub output: FormatTag,
    pub params: EncodeParams,
}

/// Geometry to apply to the upright source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Resize(Dimensions),
    Crop(CropRect),
}

/// Plan a thumbnail without executing it.
pub fn plan_thumbnail(display: Dimensions, request: &ThumbnailRequest) -> Geometry {
    Geometry::Resize(thumbnail_dimensions(
        display,
        request.max_width,
        request.max_height,
        request.fit_inside,
    ))
}

/// Plan a crop without executing it.
pub fn plan_crop(display: Dimensions, request: &CropRequest) -> Geometry {
    Geometry::Crop(crop_rect(
        display,
        request.target_width,
        request.target_height,
    ))
}

/// A backend buffer released when dropped.
struct Scratch<'a, B: ImageBackend> {
    backend: &'a B,
    buffer: Option<B::Buffer>,
}

impl<'a, B: ImageBackend> Scratch<'a, B> {
    fn new(backend: &'a B, buffer: B::Buffer) -> Self {
        Self {
            backend,
            buffer: Some(buffer),
        }
    }
}

impl<B: ImageBackend> Deref for Scratch<'_, B> {
    type Target = B::Buffer;

    fn deref(&self) -> &B::Buffer {
        // Only emptied in drop.
        self.buffer.as_ref().expect("scratch buffer present until drop")
    }
}

impl<B: ImageBackend> Drop for Scratch<'_, B> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.backend.release(buffer);
        }
    }
}

/// Execute a planned geometry and encode the result.
pub fn render<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<'_, B>,
    geometry: Geometry,
) -> Result<Vec<u8>> {
    let upright = if source.transform.is_identity() {
        None
    } else {
        let buffer = backend
            .orient(source.buffer, source.transform)
            .map_err(ImageError::from_derive)?;
        Some(Scratch::new(backend, buffer))
    };
    let base: &B::Buffer = upright.as_deref().unwrap_or(source.buffer);

    let shaped = match geometry {
        Geometry::Resize(size) if size == source.display => None,
        Geometry::Resize(size) => Some(
            backend
                .resize(base, size.width, size.height)
                .map_err(ImageError::from_derive)?,
        ),
        Geometry::Crop(rect)
            if rect.width == source.display.width && rect.height == source.display.height =>
        {
            None
        }
        Geometry::Crop(rect) => Some(
            backend
                .crop(base, rect.width, rect.height, rect.x, rect.y)
                .map_err(ImageError::from_derive)?,
        ),
    }
    .map(|buffer| Scratch::new(backend, buffer));
    let output: &B::Buffer = shaped.as_deref().unwrap_or(base);

    log::debug!(
        "encoding {:?} from {}x{} as {}",
        geometry,
        source.display.width,
        source.display.height,
        source.output
    );
    backend
        .encode(output, source.output, &source.params)
        .map_err(ImageError::from_derive)
}

/// Create a thumbnail that fits (or fills) the requested box.
pub fn render_thumbnail<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<'_, B>,
    request: &ThumbnailRequest,
) -> Result<Vec<u8>> {
    render(backend, source, plan_thumbnail(source.display, request))
}

/// Create a centered crop of the requested size.
pub fn render_crop<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<'_, B>,
    request: &CropRequest,
) -> Result<Vec<u8>> {
    render(backend, source, plan_crop(source.display, request))
}
