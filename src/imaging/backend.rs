//! Codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the boundary to the pixel codec: everything
//! the core needs from a decoder/encoder and nothing more. The core owns the
//! policy (what to admit, what size to produce, which format to write); the
//! backend owns the pixels.
//!
//! | Step | Method | Cost |
//! |---|---|---|
//! | Signature check | [`sniff`](ImageBackend::sniff) | a few bytes |
//! | Header | [`decode_header`](ImageBackend::decode_header) | header only |
//! | Decode | [`decode_full`](ImageBackend::decode_full) | full buffer, only after admission |
//! | Transform | [`orient`](ImageBackend::orient), [`resize`](ImageBackend::resize), [`crop`](ImageBackend::crop) | new buffer each |
//! | Encode | [`encode`](ImageBackend::encode) | output bytes |
//! | Free | [`release`](ImageBackend::release) | - |
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` crate.

use super::admission::Limits;
use super::format::FormatTag;
use super::orientation::Transform;
use super::params::EncodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unsupported format")]
    Unsupported,
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Pixel count, without overflow.
    pub fn pixels(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Everything learned from a header parse, before any pixels are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    pub format: FormatTag,
    /// Size of the encoded buffer, before orientation.
    pub raw: Dimensions,
    /// EXIF orientation code; 1 when absent.
    pub orientation: u8,
    /// The source carries an alpha channel or transparency.
    pub has_alpha: bool,
    /// The source is palette-based.
    pub indexed: bool,
}

/// Trait for codec backends.
///
/// Every buffer a backend hands out is returned through
/// [`release`](ImageBackend::release) exactly once by the caller.
pub trait ImageBackend: Sync {
    /// Native decode state.
    type Buffer: Send;

    /// Identify the format from signature bytes.
    fn sniff(&self, bytes: &[u8]) -> FormatTag;

    /// Parse the header without materializing pixels.
    fn decode_header(&self, bytes: &[u8]) -> Result<HeaderInfo, BackendError>;

    /// Decode all pixels. Only called once `limits` admitted the header.
    fn decode_full(&self, bytes: &[u8], limits: &Limits) -> Result<Self::Buffer, BackendError>;

    /// Size of a buffer as stored.
    fn dimensions(&self, buffer: &Self::Buffer) -> Dimensions;

    /// Apply an orientation transform, producing an upright buffer.
    fn orient(
        &self,
        buffer: &Self::Buffer,
        transform: Transform,
    ) -> Result<Self::Buffer, BackendError>;

    /// Scale to exactly `width` x `height`.
    fn resize(
        &self,
        buffer: &Self::Buffer,
        width: u32,
        height: u32,
    ) -> Result<Self::Buffer, BackendError>;

    /// Cut out `width` x `height` at (`x`, `y`).
    fn crop(
        &self,
        buffer: &Self::Buffer,
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    ) -> Result<Self::Buffer, BackendError>;

    /// Encode to bytes.
    fn encode(
        &self,
        buffer: &Self::Buffer,
        format: FormatTag,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError>;

    /// Free a buffer.
    fn release(&self, buffer: Self::Buffer) {
        drop(buffer);
    }
}

/// One backend shared by many handles.
impl<T: ImageBackend + ?Sized> ImageBackend for &T {
    type Buffer = T::Buffer;

    fn sniff(&self, bytes: &[u8]) -> FormatTag {
        (**self).sniff(bytes)
    }

    fn decode_header(&self, bytes: &[u8]) -> Result<HeaderInfo, BackendError> {
        (**self).decode_header(bytes)
    }

    fn decode_full(&self, bytes: &[u8], limits: &Limits) -> Result<Self::Buffer, BackendError> {
        (**self).decode_full(bytes, limits)
    }

    fn dimensions(&self, buffer: &Self::Buffer) -> Dimensions {
        (**self).dimensions(buffer)
    }

    fn orient(
        &self,
        buffer: &Self::Buffer,
        transform: Transform,
    ) -> Result<Self::Buffer, BackendError> {
        (**self).orient(buffer, transform)
    }

    fn resize(
        &self,
        buffer: &Self::Buffer,
        width: u32,
        height: u32,
    ) -> Result<Self::Buffer, BackendError> {
        (**self).resize(buffer, width, height)
    }

    fn crop(
        &self,
        buffer: &Self::Buffer,
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    ) -> Result<Self::Buffer, BackendError> {
        (**self).crop(buffer, width, height, x, y)
    }

    fn encode(
        &self,
        buffer: &Self::Buffer,
        format: FormatTag,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        (**self).encode(buffer, format, params)
    }

    fn release(&self, buffer: Self::Buffer) {
        (**self).release(buffer)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Buffer handed out by [`MockBackend`]: an id plus a size, no pixels.
    #[derive(Debug)]
    pub struct MockBuffer {
        pub id: usize,
        pub dims: Dimensions,
    }

    /// Mock backend that records operations and tracks buffer ownership.
    /// Uses Mutex (not RefCell) so it is Sync like the real backend.
    ///
    /// `encode` writes `"<FORMAT> <w>x<h>"` so tests can read back what would
    /// have been produced.
    #[derive(Default)]
    pub struct MockBackend {
        header: Option<HeaderInfo>,
        /// Size reported by `decode_full`; defaults to the header size.
        decoded_dims: Option<Dimensions>,
        fail_decode: bool,
        fail_resize: bool,
        fail_encode: bool,
        operations: Mutex<Vec<RecordedOp>>,
        next_id: Mutex<usize>,
        live: Mutex<HashSet<usize>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Sniff,
        DecodeHeader,
        DecodeFull { max_buffer_pixels: u64 },
        Orient { exif: u8 },
        Resize { width: u32, height: u32 },
        Crop { width: u32, height: u32, x: u32, y: u32 },
        Encode { format: FormatTag, quality: u32 },
        Release { id: usize },
    }

    impl MockBackend {
        pub fn with_header_info(header: HeaderInfo) -> Self {
            Self {
                header: Some(header),
                ..Self::default()
            }
        }

        pub fn with_header(format: FormatTag, width: u32, height: u32, orientation: u8) -> Self {
            Self::with_header_info(HeaderInfo {
                format,
                raw: Dimensions { width, height },
                orientation,
                has_alpha: false,
                indexed: false,
            })
        }

        pub fn jpeg(width: u32, height: u32) -> Self {
            Self::with_header(FormatTag::Jpeg, width, height, 1)
        }

        /// Make `decode_full` produce a buffer of a different size than the header.
        pub fn decoding_as(mut self, dims: Dimensions) -> Self {
            self.decoded_dims = Some(dims);
            self
        }

        pub fn failing_decode(mut self) -> Self {
            self.fail_decode = true;
            self
        }

        pub fn failing_resize(mut self) -> Self {
            self.fail_resize = true;
            self
        }

        pub fn failing_encode(mut self) -> Self {
            self.fail_encode = true;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Buffers handed out and not yet released.
        pub fn live_buffers(&self) -> usize {
            self.live.lock().unwrap().len()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn acquire(&self, dims: Dimensions) -> MockBuffer {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            self.live.lock().unwrap().insert(*next);
            MockBuffer { id: *next, dims }
        }
    }

    impl ImageBackend for MockBackend {
        type Buffer = MockBuffer;

        fn sniff(&self, _bytes: &[u8]) -> FormatTag {
            self.record(RecordedOp::Sniff);
            self.header.map(|h| h.format).unwrap_or(FormatTag::Unknown)
        }

        fn decode_header(&self, _bytes: &[u8]) -> Result<HeaderInfo, BackendError> {
            self.record(RecordedOp::DecodeHeader);
            self.header
                .ok_or_else(|| BackendError::Decode("no mock header".into()))
        }

        fn decode_full(&self, _bytes: &[u8], limits: &Limits) -> Result<MockBuffer, BackendError> {
            self.record(RecordedOp::DecodeFull {
                max_buffer_pixels: limits.max_buffer_pixels,
            });
            if self.fail_decode {
                return Err(BackendError::Decode("truncated".into()));
            }
            let header = self
                .header
                .ok_or_else(|| BackendError::Decode("no mock header".into()))?;
            Ok(self.acquire(self.decoded_dims.unwrap_or(header.raw)))
        }

        fn dimensions(&self, buffer: &MockBuffer) -> Dimensions {
            buffer.dims
        }

        fn orient(
            &self,
            buffer: &MockBuffer,
            transform: Transform,
        ) -> Result<MockBuffer, BackendError> {
            self.record(RecordedOp::Orient {
                exif: transform.exif_code(),
            });
            let dims = if transform.swaps_axes() {
                Dimensions {
                    width: buffer.dims.height,
                    height: buffer.dims.width,
                }
            } else {
                buffer.dims
            };
            Ok(self.acquire(dims))
        }

        fn resize(
            &self,
            _buffer: &MockBuffer,
            width: u32,
            height: u32,
        ) -> Result<MockBuffer, BackendError> {
            self.record(RecordedOp::Resize { width, height });
            if self.fail_resize {
                return Err(BackendError::ProcessingFailed("resize".into()));
            }
            Ok(self.acquire(Dimensions { width, height }))
        }

        fn crop(
            &self,
            _buffer: &MockBuffer,
            width: u32,
            height: u32,
            x: u32,
            y: u32,
        ) -> Result<MockBuffer, BackendError> {
            self.record(RecordedOp::Crop {
                width,
                height,
                x,
                y,
            });
            Ok(self.acquire(Dimensions { width, height }))
        }

        fn encode(
            &self,
            buffer: &MockBuffer,
            format: FormatTag,
            params: &EncodeParams,
        ) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Encode {
                format,
                quality: params.quality.value(),
            });
            if self.fail_encode {
                return Err(BackendError::Encode("mock encoder refused".into()));
            }
            Ok(format!("{} {}x{}", format, buffer.dims.width, buffer.dims.height).into_bytes())
        }

        fn release(&self, buffer: MockBuffer) {
            self.record(RecordedOp::Release { id: buffer.id });
            let removed = self.live.lock().unwrap().remove(&buffer.id);
            assert!(removed, "buffer {} released twice", buffer.id);
        }
    }

    #[test]
    fn mock_builders_configure_failures() {
        let limits = Limits::new(10_000);
        let backend = MockBackend::jpeg(10, 10).failing_decode();
        assert!(backend.decode_full(&[], &limits).is_err());
        assert_eq!(backend.live_buffers(), 0);

        let backend = MockBackend::jpeg(10, 10)
            .decoding_as(Dimensions {
                width: 3,
                height: 4,
            })
            .failing_resize()
            .failing_encode();
        let buffer = backend.decode_full(&[], &limits).unwrap();
        assert_eq!(
            backend.dimensions(&buffer),
            Dimensions {
                width: 3,
                height: 4
            }
        );
        assert!(backend.resize(&buffer, 2, 2).is_err());
        assert!(backend.encode(&buffer, FormatTag::Jpeg, &EncodeParams::default()).is_err());
        backend.release(buffer);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn mock_tracks_buffer_lifetimes() {
        let backend = MockBackend::jpeg(10, 20);
        let buffer = backend.decode_full(&[], &Limits::new(1000)).unwrap();
        let resized = backend.resize(&buffer, 5, 10).unwrap();
        assert_eq!(backend.live_buffers(), 2);

        backend.release(buffer);
        backend.release(resized);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn mock_orient_swaps_for_quarter_turns() {
        let backend = MockBackend::jpeg(80, 48);
        let buffer = backend.decode_full(&[], &Limits::new(10_000)).unwrap();
        let upright = backend
            .orient(&buffer, super::super::orientation::Orientation::from_exif(6).transform())
            .unwrap();
        assert_eq!(
            backend.dimensions(&upright),
            Dimensions {
                width: 48,
                height: 80
            }
        );
        backend.release(buffer);
        backend.release(upright);
    }

    #[test]
    fn mock_encode_reports_size() {
        let backend = MockBackend::jpeg(4, 3);
        let buffer = backend.decode_full(&[], &Limits::new(100)).unwrap();
        let bytes = backend
            .encode(&buffer, FormatTag::Png, &EncodeParams::default())
            .unwrap();
        assert_eq!(bytes, b"PNG 4x3");
        backend.release(buffer);
    }

    #[test]
    fn dimensions_pixels_is_u64() {
        let dims = Dimensions {
            width: 100_000,
            height: 100_000,
        };
        assert_eq!(dims.pixels(), 10_000_000_000);
    }
}
