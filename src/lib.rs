//! # Imager
//!
//! A thumbnailing core for untrusted uploads. Bytes come in from a client;
//! the core decides whether they are an image it is willing to decode, and if
//! so, produces upright thumbnails and centered crops from them.
//!
//! # Architecture: Check Before Decode
//!
//! Every input passes through the same gate, and nothing past the header is
//! decoded until every cheap check has passed:
//!
//! ```text
//! bytes ─▶ sniff ─▶ header ─▶ orient ─▶ admit ─▶ decode ─▶ Image
//!          (magic)  (size,    (EXIF →   (min side,
//!                    EXIF)     display)  max side, budget)
//! ```
//!
//! A validated [`imaging::Image`] owns its decoded buffer until it is closed or
//! dropped. Derivations read the buffer and never change it, so one handle can
//! produce any number of thumbnails and crops.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Sniffing, admission, orientation, geometry, the codec seam, and the [`imaging::Image`] handle |
//! | [`config`] | `imager.toml` loading, merging over stock defaults, and validation |
//! | [`batch`] | Parallel thumbnailing of a directory tree |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Budgets Are Measured Upright
//!
//! The pixel budget and the side bound apply to the *display* size, after EXIF
//! orientation. For the budget this changes nothing (rotation preserves area),
//! but geometry, error reports, and logs all talk about one size: the one a
//! viewer sees.
//!
//! ## Errors a Client Can Act On
//!
//! [`imaging::ImageError`] has four variants. Corrupt data, a bad signature,
//! and a degenerate size all collapse into `UnknownFormat`; oversized input is
//! `TooBig` with the numbers attached. Codec detail stays in the logs. Callers
//! map the first two to 4xx and `Encode` to 5xx via
//! [`imaging::ImageError::is_client_error`].
//!
//! ## One Codec Seam
//!
//! All pixel work goes through [`imaging::ImageBackend`]. The default
//! [`imaging::RustBackend`] is pure Rust on the `image` crate with only the JPEG,
//! PNG, and GIF decoders compiled in. Tests drive the same pipeline through a
//! recording mock to check operation order and buffer release.
//!
//! ## No Upscaling
//!
//! Thumbnails never exceed the source. Asking for a 2048px box from a 400px
//! image returns the image at its own size, re-encoded and upright.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
