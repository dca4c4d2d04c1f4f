//! Directory batch thumbnailing.
//!
//! Walks a directory tree, runs every JPEG/PNG/GIF through an [`Image`] handle,
//! and writes one thumbnail per source into a mirrored output tree.
//!
//! ## Output Naming
//!
//! The relative path is kept. When the output format matches the source
//! extension the file name is unchanged; otherwise the output extension is
//! appended so siblings never collide:
//!
//! ```text
//! photos/                      thumbs/
//! ├── dawn.jpg          →      ├── dawn.jpg
//! ├── logo.png          →      ├── logo.png
//! └── trips/                   └── trips/
//!     └── loop.gif      →          └── loop.gif.png
//! ```
//!
//! ## Failure Model
//!
//! Files the core refuses (unknown format, over budget) are reported as
//! [`BatchOutcome::Rejected`] and the batch carries on. Encoder faults and
//! filesystem errors abort the batch.
//!
//! Sources are processed in parallel with [rayon](https://docs.rs/rayon); one
//! handle per file, so nothing is shared between workers.

use crate::imaging::{
    FormatTag, Image, ImageError, ImageOptions, ThumbnailRequest, thumbnail_dimensions,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Image processing failed for {path}: {source}")]
    Imaging {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// Result of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Written {
        source: PathBuf,
        output: PathBuf,
        width: u32,
        height: u32,
        format: FormatTag,
    },
    Rejected {
        source: PathBuf,
        reason: String,
    },
}

impl BatchOutcome {
    pub fn source(&self) -> &Path {
        match self {
            BatchOutcome::Written { source, .. } | BatchOutcome::Rejected { source, .. } => source,
        }
    }
}

/// Outcomes in source path order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BatchOutcome::Written { .. }))
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.written()
    }
}

/// Format implied by a file extension, case-insensitive.
fn extension_format(path: &Path) -> FormatTag {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => FormatTag::Jpeg,
        Some("png") => FormatTag::Png,
        Some("gif") => FormatTag::Gif,
        _ => FormatTag::Unknown,
    }
}

/// Every file under `dir` with an image extension, sorted.
pub fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() && extension_format(entry.path()).is_known() {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

/// Output path for `source` (relative to `dir`) written as `format`.
pub fn output_path(dir: &Path, out_dir: &Path, source: &Path, format: FormatTag) -> PathBuf {
    let relative = source.strip_prefix(dir).unwrap_or(source);
    let target = out_dir.join(relative);
    if extension_format(source) == format {
        target
    } else {
        let mut name = target.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(format.extension());
        target.with_file_name(name)
    }
}

/// Thumbnail every image under `dir` into `out_dir`.
pub fn thumbnail_dir(
    dir: &Path,
    out_dir: &Path,
    request: &ThumbnailRequest,
    options: &ImageOptions,
) -> Result<BatchReport, BatchError> {
    let sources = collect_sources(dir)?;
    log::info!("thumbnailing {} images from {}", sources.len(), dir.display());

    let outcomes = sources
        .par_iter()
        .map(|source| thumbnail_one(dir, out_dir, source, request, options))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchReport { outcomes })
}

fn thumbnail_one(
    dir: &Path,
    out_dir: &Path,
    source: &Path,
    request: &ThumbnailRequest,
    options: &ImageOptions,
) -> Result<BatchOutcome, BatchError> {
    let bytes = fs::read(source)?;
    let rejected = |err: ImageError| -> Result<BatchOutcome, BatchError> {
        if err.is_client_error() {
            log::warn!("skipping {}: {}", source.display(), err);
            Ok(BatchOutcome::Rejected {
                source: source.to_path_buf(),
                reason: err.to_string(),
            })
        } else {
            Err(BatchError::Imaging {
                path: source.to_path_buf(),
                source: err,
            })
        }
    };

    let image = match Image::with_options(&bytes, options) {
        Ok(image) => image,
        Err(err) => return rejected(err),
    };
    let encoded = match image.thumbnail(request.max_width, request.max_height, request.fit_inside) {
        Ok(encoded) => encoded,
        Err(err) => return rejected(err),
    };
    let size = thumbnail_dimensions(
        image.dimensions(),
        request.max_width,
        request.max_height,
        request.fit_inside,
    );

    let output = output_path(dir, out_dir, source, image.output_format());
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, encoded)?;
    log::debug!("wrote {}", output.display());

    Ok(BatchOutcome::Written {
        source: source.to_path_buf(),
        output,
        width: size.width,
        height: size.height,
        format: image.output_format(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(width, height, Rgb([200, 120, 40]))
            .save(path)
            .unwrap();
    }

    // =========================================================================
    // naming
    // =========================================================================

    #[test]
    fn output_path_keeps_matching_extension() {
        let path = output_path(
            Path::new("in"),
            Path::new("out"),
            Path::new("in/trips/dawn.JPG"),
            FormatTag::Jpeg,
        );
        assert_eq!(path, PathBuf::from("out/trips/dawn.JPG"));
    }

    #[test]
    fn output_path_appends_changed_extension() {
        let path = output_path(
            Path::new("in"),
            Path::new("out"),
            Path::new("in/loop.gif"),
            FormatTag::Png,
        );
        assert_eq!(path, PathBuf::from("out/loop.gif.png"));
    }

    #[test]
    fn collect_sources_filters_by_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.png"), b"x").unwrap();
        fs::write(tmp.path().join("a.jpeg"), b"x").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub/c.gif"), b"x").unwrap();

        let names: Vec<_> = collect_sources(tmp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.jpeg"),
                PathBuf::from("b.png"),
                PathBuf::from("sub/c.gif")
            ]
        );
    }

    // =========================================================================
    // thumbnail_dir
    // =========================================================================

    #[test]
    fn thumbnails_mirror_the_source_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("out");
        write_jpeg(&src.join("wide.jpg"), 40, 20);
        write_jpeg(&src.join("nested/tall.jpg"), 20, 40);

        let report = thumbnail_dir(
            &src,
            &out,
            &ThumbnailRequest::fit(10, 10),
            &ImageOptions::new(10_000),
        )
        .unwrap();

        assert_eq!(report.written(), 2);
        assert_eq!(report.rejected(), 0);
        assert!(matches!(
            &report.outcomes[0],
            BatchOutcome::Written { width: 5, height: 10, format: FormatTag::Jpeg, .. }
        ));
        assert!(matches!(
            &report.outcomes[1],
            BatchOutcome::Written { width: 10, height: 5, .. }
        ));

        let written = image::open(out.join("nested/tall.jpg")).unwrap();
        assert_eq!((written.width(), written.height()), (5, 10));
        assert!(out.join("wide.jpg").exists());
    }

    #[test]
    fn refused_files_are_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("out");
        write_jpeg(&src.join("big.jpg"), 200, 200);
        write_jpeg(&src.join("small.jpg"), 20, 20);
        fs::write(src.join("fake.png"), b"definitely not a png").unwrap();

        let report = thumbnail_dir(
            &src,
            &out,
            &ThumbnailRequest::fit(10, 10),
            &ImageOptions::new(1_000),
        )
        .unwrap();

        assert_eq!(report.written(), 1);
        assert_eq!(report.rejected(), 2);
        let reasons: Vec<_> = report
            .outcomes
            .iter()
            .filter_map(|o| match o {
                BatchOutcome::Rejected { reason, .. } => Some(reason.as_str()),
                _ => None,
            })
            .collect();
        assert!(reasons[0].contains("too big"), "{reasons:?}");
        assert!(reasons[1].contains("unknown"), "{reasons:?}");
        assert!(!out.join("big.jpg").exists());
        assert!(out.join("small.jpg").exists());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = thumbnail_dir(
            &tmp.path().join("nope"),
            &tmp.path().join("out"),
            &ThumbnailRequest::fit(10, 10),
            &ImageOptions::new(1_000),
        );
        assert!(matches!(result, Err(BatchError::Walk(_))));
    }
}
