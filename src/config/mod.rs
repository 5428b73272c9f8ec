//! Configuration management for the gallery optimizer

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{Result, OptimizerError};
use crate::processing::resize::FilterType;

/// Widest image (in pixels) left untouched by default
pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Default encoder quality for lossy formats
pub const DEFAULT_QUALITY: u8 = 80;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory whose images are optimized in place
    pub directory: Option<PathBuf>,

    /// Resize and encode settings
    pub optimize: OptimizeConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Settings applied to every image of a batch pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizeConfig {
    /// Images wider than this are scaled down to exactly this width
    pub max_width: u32,

    /// Encoder quality (0-100); ignored by lossless formats
    pub quality: u8,

    /// Resampling filter used when scaling down
    pub filter: FilterType,

    /// Re-encode images that are already within `max_width`
    pub reencode_unresized: bool,

    /// Decode and plan, but never write
    pub dry_run: bool,

    /// Maximum file size to process (in bytes)
    pub max_file_size: u64,

    /// Maximum image dimensions (width * height)
    pub max_image_pixels: u64,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
            filter: FilterType::Lanczos3,
            reencode_unresized: true,
            dry_run: false,
            max_file_size: 200 * 1024 * 1024, // 200MB
            max_image_pixels: 250_000_000,    // 250 megapixels
        }
    }
}

impl OptimizeConfig {
    /// Create a configuration with the default width and quality
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum width
    pub fn max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    /// Set the encoder quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the resampling filter
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Leave images that need no resize untouched
    pub fn skip_unresized(mut self) -> Self {
        self.reencode_unresized = false;
        self
    }

    /// Enable or disable dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(OptimizerError::invalid_parameters(
                "Maximum width must be greater than 0",
            ));
        }
        if self.quality > 100 {
            return Err(OptimizerError::invalid_parameters(format!(
                "Quality must be between 0 and 100 (got {})",
                self.quality
            )));
        }
        if self.max_file_size == 0 {
            return Err(OptimizerError::invalid_parameters(
                "Maximum file size must be greater than 0",
            ));
        }
        if self.max_image_pixels == 0 {
            return Err(OptimizerError::invalid_parameters(
                "Maximum image pixels must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter (trace, debug, info, warn, error, or an env-filter directive)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Supported image formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Whether the encoder discards information according to a quality setting
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            OptimizerError::config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        match config_extension(path.as_ref()).as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(OptimizerError::config(
                "Unsupported config file format. Use .toml or .yaml",
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = match config_extension(path.as_ref()).as_str() {
            "toml" => toml::to_string_pretty(self).map_err(|e| {
                OptimizerError::config(format!("TOML serialization failed: {}", e))
            })?,
            "yaml" | "yml" => serde_yaml::to_string(self).map_err(|e| {
                OptimizerError::config(format!("YAML serialization failed: {}", e))
            })?,
            _ => {
                return Err(OptimizerError::config(
                    "Unsupported config file format. Use .toml or .yaml",
                ))
            }
        };

        std::fs::write(&path, content).map_err(|e| {
            OptimizerError::config(format!(
                "Failed to write config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.optimize
            .validate()
            .map_err(|e| OptimizerError::config(format!("Invalid [optimize] section: {}", e)))?;

        tracing_subscriber::EnvFilter::try_new(&self.logging.level).map_err(|e| {
            OptimizerError::config(format!(
                "Invalid log level '{}': {}",
                self.logging.level, e
            ))
        })?;

        if let Some(dir) = &self.directory {
            if dir.as_os_str().is_empty() {
                return Err(OptimizerError::config("Directory must not be empty"));
            }
        }

        Ok(())
    }
}

fn config_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.optimize.max_width, 1920);
        assert_eq!(config.optimize.quality, 80);
        assert!(config.optimize.reencode_unresized);
        assert!(config.directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = OptimizeConfig::new()
            .max_width(800)
            .quality(65)
            .filter(FilterType::CatmullRom)
            .skip_unresized()
            .dry_run(true);
        assert_eq!(config.max_width, 800);
        assert_eq!(config.quality, 65);
        assert_eq!(config.filter, FilterType::CatmullRom);
        assert!(!config.reencode_unresized);
        assert!(config.dry_run);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(OptimizeConfig::new().max_width(0).validate().is_err());
        assert!(OptimizeConfig::new().quality(101).validate().is_err());
        assert!(OptimizeConfig::new().quality(0).validate().is_ok());

        let mut config = Config::default();
        config.logging.level = "gallery_optimizer=loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            directory = "/srv/gallery"

            [optimize]
            quality = 70
            "#,
        )
        .unwrap();
        assert_eq!(parsed.directory, Some(PathBuf::from("/srv/gallery")));
        assert_eq!(parsed.optimize.quality, 70);
        assert_eq!(parsed.optimize.max_width, DEFAULT_MAX_WIDTH);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_config_file_io() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.directory = Some(PathBuf::from("/srv/gallery"));
        config.optimize.filter = FilterType::Triangle;

        let toml_path = dir.path().join("optimizer.toml");
        config.to_file(&toml_path).unwrap();
        let loaded = Config::from_file(&toml_path).unwrap();
        assert_eq!(loaded.optimize, config.optimize);
        assert_eq!(loaded.directory, config.directory);

        let yaml_path = dir.path().join("optimizer.yaml");
        config.to_file(&yaml_path).unwrap();
        let loaded = Config::from_file(&yaml_path).unwrap();
        assert_eq!(loaded.optimize, config.optimize);

        assert!(config.to_file(dir.path().join("optimizer.ini")).is_err());
        assert!(Config::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_image_format_properties() {
        assert!(ImageFormat::Jpeg.is_lossy());
        assert!(!ImageFormat::Png.is_lossy());
    }
}
