//! Pre-decode file checks and post-decode size limits

use std::path::Path;
use tracing::debug;

use crate::config::OptimizeConfig;
use crate::error::{Result, OptimizerError};
use crate::processing::resize::Dimensions;

/// Image validator for checking a file before it is decoded
#[derive(Debug, Clone, Copy)]
pub struct ImageValidator {
    max_file_size: u64,
    max_image_pixels: u64,
}

impl ImageValidator {
    /// Create a validator with the default limits
    pub fn new() -> Self {
        Self::from_config(&OptimizeConfig::default())
    }

    /// Create a validator with the limits of `config`
    pub fn from_config(config: &OptimizeConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_image_pixels: config.max_image_pixels,
        }
    }

    /// Create a validator with custom limits
    pub fn with_limits(max_file_size: u64, max_image_pixels: u64) -> Self {
        Self {
            max_file_size,
            max_image_pixels,
        }
    }

    /// Check that `path` is a non-empty regular file within the size limit.
    ///
    /// Returns the file size in bytes.
    pub fn validate_file<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let path = path.as_ref();
        debug!("Validating file: {:?}", path);

        let metadata = std::fs::metadata(path).map_err(|e| {
            OptimizerError::validation(format!("Cannot access file: {}", e), Some(path.to_path_buf()))
        })?;

        if !metadata.is_file() {
            return Err(OptimizerError::validation(
                "Path is not a regular file",
                Some(path.to_path_buf()),
            ));
        }

        let file_size = metadata.len();
        if file_size == 0 {
            return Err(OptimizerError::validation(
                "File is empty",
                Some(path.to_path_buf()),
            ));
        }

        if file_size > self.max_file_size {
            return Err(OptimizerError::file_too_large(
                file_size,
                self.max_file_size,
                path.to_path_buf(),
            ));
        }

        Ok(file_size)
    }

    /// Check decoded dimensions against the pixel limit
    pub fn check_dimensions<P: AsRef<Path>>(&self, dimensions: Dimensions, path: P) -> Result<()> {
        if dimensions.pixel_count() > self.max_image_pixels {
            return Err(OptimizerError::image_too_large(
                dimensions.width,
                dimensions.height,
                self.max_image_pixels,
                Some(path.as_ref().to_path_buf()),
            ));
        }
        Ok(())
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new()
    }
}
