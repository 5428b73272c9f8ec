//! Gallery Optimizer - shrink and recompress a directory of images in place
//!
//! Every `.jpg`, `.jpeg` and `.png` file directly inside a directory is
//! scaled down to a maximum width (keeping its aspect ratio) when it is wider
//! than that, then re-encoded over the original. Other entries are left
//! alone, and one broken file never stops the rest of the batch.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gallery_optimizer::{optimize_all, OptimizeConfig};
//!
//! let config = OptimizeConfig::new()
//!     .max_width(1920)
//!     .quality(80);
//!
//! let report = optimize_all("public/Gallery", &config)?;
//! for file in &report.files {
//!     for line in file.log_lines() {
//!         println!("{}", line);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod processing;

// Re-export commonly used types
pub use batch::{optimize_all, optimize_all_with, BatchReport, FileReport};
pub use config::{Config, ImageFormat, OptimizeConfig};
pub use error::{OptimizerError, Result};
pub use processing::{Dimensions, FileOutcome, FilterType, Optimizer, SkipReason};

use tracing::debug;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global `tracing` subscriber.
///
/// `level` is an env-filter directive such as `info` or
/// `gallery_optimizer=debug`. Diagnostics go to stderr so stdout only carries
/// the per-file report. Calling this again after a subscriber is installed
/// is a no-op.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .map_err(|e| OptimizerError::config(format!("Invalid log level '{}': {}", level, e)))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        debug!("Gallery Optimizer v{} initialized", VERSION);
    }

    Ok(())
}
