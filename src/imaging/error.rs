//! Caller-facing error taxonomy.
//!
//! | Variant | Cause | Typical HTTP mapping |
//! |---|---|---|
//! | [`ImageError::UnknownFormat`] | bad signature, corrupt data, or degenerate size | 4xx |
//! | [`ImageError::TooBig`] | display size over the admission budget | 4xx |
//! | [`ImageError::Encode`] | codec failed on a valid request | 5xx |
//! | [`ImageError::Closed`] | derivation on a released handle | programming error |
//!
//! Nothing here is retried: a corrupt or oversized image cannot succeed on a
//! second attempt.

use super::backend::BackendError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("unknown or unsupported image format")]
    UnknownFormat,
    #[error("image too big: {pixels} pixels (budget {budget})")]
    TooBig { pixels: u64, budget: u64 },
    #[error("failed to encode derived image: {0}")]
    Encode(String),
    #[error("image handle already closed")]
    Closed,
}

impl ImageError {
    /// Whether the failure is the caller's input (as opposed to the codec).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownFormat | Self::TooBig { .. })
    }

    /// Map a codec failure that happened while decoding the source.
    pub(crate) fn from_decode(err: BackendError) -> Self {
        log::debug!("decode rejected: {err}");
        Self::UnknownFormat
    }

    /// Map a codec failure that happened while producing a derivative.
    pub(crate) fn from_derive(err: BackendError) -> Self {
        Self::Encode(err.to_string())
    }
}
