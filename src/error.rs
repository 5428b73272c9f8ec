//! Error types and handling for the gallery optimizer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for optimizer operations
pub type Result<T> = std::result::Result<T, OptimizerError>;

/// Main error type for optimizer operations
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The target directory could not be listed
    #[error("Cannot read directory {path:?}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image dimensions too large
    #[error("Image too large: {width}x{height} pixels (limit: {limit} pixels, file: {file:?})")]
    ImageTooLarge {
        width: u32,
        height: u32,
        limit: u64,
        file: Option<PathBuf>,
    },

    /// File size too large
    #[error("File too large: {size} bytes (limit: {limit} bytes, file: {file:?})")]
    FileTooLarge {
        size: u64,
        limit: u64,
        file: PathBuf,
    },

    /// Invalid resize or encode parameters
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// File validation errors
    #[error("File validation failed: {message} (file: {file:?})")]
    ValidationError {
        message: String,
        file: Option<PathBuf>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),
}

impl OptimizerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new directory listing error
    pub fn directory(path: PathBuf, source: std::io::Error) -> Self {
        Self::DirectoryError { path, source }
    }

    /// Create a new image too large error
    pub fn image_too_large(width: u32, height: u32, limit: u64, file: Option<PathBuf>) -> Self {
        Self::ImageTooLarge {
            width,
            height,
            limit,
            file,
        }
    }

    /// Create a new file too large error
    pub fn file_too_large(size: u64, limit: u64, file: PathBuf) -> Self {
        Self::FileTooLarge { size, limit, file }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::ValidationError {
            message: message.into(),
            file,
        }
    }

    /// Check if this error only affects a single file (the batch can continue)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::IoError(_)
            | Self::ImageError(_)
            | Self::ImageTooLarge { .. }
            | Self::FileTooLarge { .. }
            | Self::ValidationError { .. } => true,

            Self::ConfigError { .. }
            | Self::DirectoryError { .. }
            | Self::InvalidParameters { .. }
            | Self::SerdeError(_) => false,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::ImageTooLarge { file, .. }
            | Self::ValidationError { file, .. } => file.as_ref(),

            Self::FileTooLarge { file, .. } => Some(file),
            Self::DirectoryError { path, .. } => Some(path),

            _ => None,
        }
    }

    /// Get a short message suitable for a per-file report line
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError(e) => e.to_string(),
            Self::ImageError(e) => e.to_string(),
            Self::ValidationError { message, .. } => message.clone(),
            Self::ImageTooLarge { width, height, limit, .. } => format!(
                "image is too large ({}x{} = {} pixels, limit {})",
                width,
                height,
                u64::from(*width) * u64::from(*height),
                limit
            ),
            Self::FileTooLarge { size, limit, .. } => format!(
                "file is too large ({:.2} MB, limit {:.2} MB)",
                *size as f64 / 1024.0 / 1024.0,
                *limit as f64 / 1024.0 / 1024.0
            ),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for OptimizerError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for OptimizerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<OptimizerError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();

            match &mut error {
                OptimizerError::ImageTooLarge { file: f, .. }
                | OptimizerError::ValidationError { file: f, .. } => {
                    if f.is_none() {
                        *f = Some(file);
                    }
                }
                _ => {}
            }

            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = OptimizerError::config("test message");
        assert!(matches!(err, OptimizerError::ConfigError { .. }));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(OptimizerError::validation("empty", None).is_recoverable());
        assert!(OptimizerError::file_too_large(10, 5, PathBuf::from("a.jpg")).is_recoverable());
        assert!(!OptimizerError::config("bad").is_recoverable());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!OptimizerError::directory(PathBuf::from("/nope"), io).is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        let err = OptimizerError::validation("File is empty", None);
        assert_eq!(err.user_message(), "File is empty");

        let err = OptimizerError::image_too_large(100, 100, 5000, None);
        assert!(err.user_message().contains("10000 pixels"));
    }

    #[test]
    fn test_file_context() {
        let result: Result<()> = Err(OptimizerError::validation("broken", None));
        let err = result
            .with_file_context(Path::new("a.png").to_path_buf())
            .unwrap_err();
        assert_eq!(err.file_path(), Some(&PathBuf::from("a.png")));

        // Existing context is not overwritten
        let result: Result<()> = Err(OptimizerError::validation("broken", Some("b.png".into())));
        let err = result
            .with_file_context(Path::new("a.png").to_path_buf())
            .unwrap_err();
        assert_eq!(err.file_path(), Some(&PathBuf::from("b.png")));
    }
}
