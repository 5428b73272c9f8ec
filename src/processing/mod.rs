//! Per-file image processing: load, resize, re-encode in place

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ImageFormat, OptimizeConfig};
use crate::error::{ErrorContext, OptimizerError, Result};

pub mod formats;
pub mod resize;
pub mod validation;

pub use formats::*;
pub use resize::*;
pub use validation::*;

/// Why a directory entry was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The file name does not end in a supported image suffix
    NotAnImage,
    /// Already within the width limit and re-encoding is disabled
    WithinLimit,
}

/// What happened to one directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Skipped {
        reason: SkipReason,
    },
    Resized {
        from: Dimensions,
        to: Dimensions,
        bytes_before: u64,
        /// `None` in dry-run mode
        bytes_after: Option<u64>,
    },
    OptimizedOnly {
        dimensions: Dimensions,
        bytes_before: u64,
        bytes_after: Option<u64>,
    },
    Failed {
        reason: String,
        /// Set when the image was scaled down but the save then failed
        #[serde(skip_serializing_if = "Option::is_none")]
        resized_to: Option<Dimensions>,
    },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// File sizes before and after, for outcomes that touched the file
    pub fn sizes(&self) -> Option<(u64, Option<u64>)> {
        match self {
            Self::Resized {
                bytes_before,
                bytes_after,
                ..
            }
            | Self::OptimizedOnly {
                bytes_before,
                bytes_after,
                ..
            } => Some((*bytes_before, *bytes_after)),
            _ => None,
        }
    }
}

/// Information about a loaded image file
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub dimensions: Dimensions,
    pub file_size: u64,
}

/// Optimizes single files according to one [`OptimizeConfig`]
pub struct Optimizer {
    config: OptimizeConfig,
    resizer: ImageResizer,
    validator: ImageValidator,
}

impl Optimizer {
    /// Create an optimizer, rejecting invalid settings up front
    pub fn new(config: OptimizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resizer: ImageResizer::with_filter(config.filter),
            validator: ImageValidator::from_config(&config),
            config,
        })
    }

    /// Optimize one file in place.
    ///
    /// Every failure is folded into [`FileOutcome::Failed`]; this never
    /// aborts the caller's batch.
    pub fn optimize_file<P: AsRef<Path>>(&self, path: P) -> FileOutcome {
        let path = path.as_ref();
        let name = display_name(path);

        let Some(format) = detect_format_from_name(&name) else {
            debug!("Skipping non-image entry: {}", name);
            return FileOutcome::Skipped {
                reason: SkipReason::NotAnImage,
            };
        };

        match self.try_optimize(path, format) {
            Ok(outcome) => outcome,
            Err(e) => failed(path, &e, None),
        }
    }

    fn try_optimize(&self, path: &Path, format: ImageFormat) -> Result<FileOutcome> {
        let (image, original) = self.load_image(path)?;

        let resized = self.resizer.resize_to_width(&image, self.config.max_width)?;

        if resized.is_none() && !self.config.reencode_unresized {
            debug!(
                "Leaving {} untouched ({} is within {}px)",
                path.display(),
                original.dimensions,
                self.config.max_width
            );
            return Ok(FileOutcome::Skipped {
                reason: SkipReason::WithinLimit,
            });
        }

        let output = resized.as_ref().unwrap_or(&image);
        let bytes_after = if self.config.dry_run {
            debug!("Dry run, not writing {}", path.display());
            None
        } else {
            match self.save_image(output, path, format) {
                Ok(size) => Some(size),
                Err(e) => return Ok(failed(path, &e, resized.as_ref().map(Dimensions::of))),
            }
        };

        Ok(match resized {
            Some(resized) => FileOutcome::Resized {
                from: original.dimensions,
                to: Dimensions::of(&resized),
                bytes_before: original.file_size,
                bytes_after,
            },
            None => FileOutcome::OptimizedOnly {
                dimensions: original.dimensions,
                bytes_before: original.file_size,
                bytes_after,
            },
        })
    }

    /// Load an image from file.
    ///
    /// The file is read in one call, so its handle is closed before decoding
    /// starts and long before the same path is rewritten.
    pub fn load_image(&self, path: &Path) -> Result<(DynamicImage, ImageInfo)> {
        debug!("Loading image: {:?}", path);

        let file_size = self.validator.validate_file(path)?;
        let data = std::fs::read(path).with_file_context(path.to_path_buf())?;

        // Content decides the decoder, the file name only decides the encoder
        let dimensions = {
            let (width, height) = image::io::Reader::new(Cursor::new(&data))
                .with_guessed_format()?
                .into_dimensions()?;
            Dimensions::new(width, height)
        };
        self.validator.check_dimensions(dimensions, path)?;

        let image = image::io::Reader::new(Cursor::new(&data))
            .with_guessed_format()?
            .decode()?;

        let info = ImageInfo {
            path: path.to_path_buf(),
            dimensions: Dimensions::of(&image),
            file_size,
        };

        debug!(
            "Loaded image: {} ({:.2}MB)",
            info.dimensions,
            info.file_size as f64 / 1024.0 / 1024.0
        );

        Ok((image, info))
    }

    /// Encode `image` and overwrite `path` with the result.
    ///
    /// Encoding happens fully in memory first, so a failed encode leaves the
    /// original bytes on disk. Returns the new file size.
    pub fn save_image(&self, image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<u64> {
        if format.is_lossy() {
            debug!("Saving image: {:?} as {:?}, quality: {}", path, format, self.config.quality);
        } else {
            debug!("Saving image: {:?} as {:?}", path, format);
        }

        let bytes = encode_image(image, format, self.config.quality)?;
        std::fs::write(path, &bytes).with_file_context(path.to_path_buf())?;

        debug!(
            "Saved image: {} ({:.2}MB)",
            Dimensions::of(image),
            bytes.len() as f64 / 1024.0 / 1024.0
        );

        Ok(bytes.len() as u64)
    }
}

fn failed(path: &Path, error: &OptimizerError, resized_to: Option<Dimensions>) -> FileOutcome {
    warn!("Failed to process {}: {}", path.display(), error);
    FileOutcome::Failed {
        reason: error.user_message(),
        resized_to,
    }
}

/// File name as shown in report lines
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_test_image(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        DynamicImage::ImageRgb8(img).save(path).unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Optimizer::new(OptimizeConfig::new().max_width(0)).is_err());
    }

    #[test]
    fn test_resizes_wide_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.jpg");
        write_test_image(&path, 300, 200);

        let optimizer = Optimizer::new(OptimizeConfig::new().max_width(120)).unwrap();
        let outcome = optimizer.optimize_file(&path);

        match outcome {
            FileOutcome::Resized { from, to, bytes_after, .. } => {
                assert_eq!(from, Dimensions::new(300, 200));
                assert_eq!(to, Dimensions::new(120, 80));
                assert!(bytes_after.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let reloaded = image::open(&path).unwrap();
        assert_eq!(Dimensions::of(&reloaded), Dimensions::new(120, 80));
    }

    #[test]
    fn test_reencodes_narrow_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.png");
        write_test_image(&path, 40, 30);

        let optimizer = Optimizer::new(OptimizeConfig::new()).unwrap();
        assert!(matches!(
            optimizer.optimize_file(&path),
            FileOutcome::OptimizedOnly { dimensions, bytes_after: Some(_), .. }
                if dimensions == Dimensions::new(40, 30)
        ));
    }

    #[test]
    fn test_skip_unresized_leaves_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.jpg");
        write_test_image(&path, 40, 30);
        let before = std::fs::read(&path).unwrap();

        let optimizer = Optimizer::new(OptimizeConfig::new().skip_unresized()).unwrap();
        assert_eq!(
            optimizer.optimize_file(&path),
            FileOutcome::Skipped {
                reason: SkipReason::WithinLimit
            }
        );
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.png");
        write_test_image(&path, 300, 200);
        let before = std::fs::read(&path).unwrap();

        let optimizer = Optimizer::new(OptimizeConfig::new().max_width(100).dry_run(true)).unwrap();
        assert!(matches!(
            optimizer.optimize_file(&path),
            FileOutcome::Resized { bytes_after: None, .. }
        ));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_failures_are_captured() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.jpg");
        std::fs::write(&empty, b"").unwrap();
        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();

        let optimizer = Optimizer::new(OptimizeConfig::new()).unwrap();
        assert!(optimizer.optimize_file(&empty).is_failure());
        assert!(optimizer.optimize_file(&corrupt).is_failure());
        // The corrupt file is not touched
        assert_eq!(std::fs::read(&corrupt).unwrap(), b"definitely not a png");
    }

    #[test]
    fn test_save_failure_keeps_planned_resize() {
        let dir = TempDir::new().unwrap();
        // PNG content under a .jpg name; the JPEG encoder rejects widths above 65535
        let path = dir.path().join("wide.jpg");
        let img = ImageBuffer::from_pixel(70_001, 2, Rgb([200u8, 100, 50]));
        DynamicImage::ImageRgb8(img)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        let before = std::fs::read(&path).unwrap();

        let optimizer = Optimizer::new(OptimizeConfig::new().max_width(70_000)).unwrap();
        match optimizer.optimize_file(&path) {
            FileOutcome::Failed { resized_to, .. } => {
                assert_eq!(resized_to, Some(Dimensions::new(70_000, 1)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // Nothing was written
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_pixel_limit_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.png");
        write_test_image(&path, 50, 50);

        let mut config = OptimizeConfig::new();
        config.max_image_pixels = 100;
        let optimizer = Optimizer::new(config).unwrap();
        match optimizer.optimize_file(&path) {
            FileOutcome::Failed { reason, resized_to } => {
                assert!(reason.contains("too large"));
                assert_eq!(resized_to, None);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_non_image_skipped() {
        let optimizer = Optimizer::new(OptimizeConfig::new()).unwrap();
        assert_eq!(
            optimizer.optimize_file(Path::new("/does/not/matter/b.txt")),
            FileOutcome::Skipped {
                reason: SkipReason::NotAnImage
            }
        );
    }

    #[test]
    fn test_outcome_sizes() {
        let outcome = FileOutcome::OptimizedOnly {
            dimensions: Dimensions::new(1, 1),
            bytes_before: 10,
            bytes_after: Some(7),
        };
        assert_eq!(outcome.sizes(), Some((10, Some(7))));
        assert_eq!(FileOutcome::Failed { reason: "x".into(), resized_to: None }.sizes(), None);
    }
}
