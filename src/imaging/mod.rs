//! Image validation, orientation, and thumbnail/crop geometry.
//!
//! | Stage | Module | Needs pixels? |
//! |---|---|---|
//! | **Sniff** | [`format`]: signature bytes → [`FormatTag`] | no |
//! | **Admit** | [`admission`]: minimum size, side bound, pixel budget | no |
//! | **Orient** | [`orientation`]: EXIF code → display size + [`Transform`] | no |
//! | **Plan** | `calculations`: fit / fill / crop geometry | no |
//! | **Build** | [`operations`]: orient → resize/crop → encode | yes |
//! | **Own** | [`handle`]: the [`Image`] lifecycle | yes |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing requests and encoder settings
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Functions combining calculations + backend
//!
//! ```no_run
//! use imager::imaging::Image;
//!
//! let bytes = std::fs::read("upload.jpg")?;
//! let img = Image::new(&bytes, 10_000_000)?;
//! let thumb = img.thumbnail(200, 300, true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod admission;
pub mod backend;
mod calculations;
pub mod error;
pub mod format;
pub mod handle;
pub mod operations;
pub mod orientation;
mod params;
pub mod rust_backend;

pub use admission::Limits;
pub use backend::{BackendError, Dimensions, HeaderInfo, ImageBackend};
pub use calculations::{CropRect, crop_rect, thumbnail_dimensions};
pub use error::ImageError;
pub use format::{FormatPolicy, FormatTag};
pub use handle::{Image, ImageOptions};
pub use orientation::{Orientation, Transform};
pub use params::{CropRequest, EncodeParams, Quality, ThumbnailRequest};
pub use rust_backend::RustBackend;
