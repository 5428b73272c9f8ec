//! Sequential batch pass over one directory

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::OptimizeConfig;
use crate::error::{Result, OptimizerError};
use crate::processing::{display_name, Optimizer};

pub mod report;

pub use report::*;

/// List the entries directly inside `directory`, sorted by file name.
///
/// Failing to list the directory is fatal for the whole batch.
pub fn discover_files<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();

    let entries = std::fs::read_dir(directory)
        .map_err(|e| OptimizerError::directory(directory.to_path_buf(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| OptimizerError::directory(directory.to_path_buf(), e))?;
        files.push(entry.path());
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Optimize every supported image directly inside `directory`.
pub fn optimize_all<P: AsRef<Path>>(directory: P, config: &OptimizeConfig) -> Result<BatchReport> {
    optimize_all_with(directory, config, |_| {})
}

/// Like [`optimize_all`], calling `on_file` as soon as each entry is done.
///
/// Entries are handled one at a time in file name order. A failing file is
/// recorded and the pass moves on; only configuration and directory listing
/// errors are returned as `Err`.
pub fn optimize_all_with<P, F>(directory: P, config: &OptimizeConfig, mut on_file: F) -> Result<BatchReport>
where
    P: AsRef<Path>,
    F: FnMut(&FileReport),
{
    let directory = directory.as_ref();
    let start_time = Instant::now();

    let optimizer = Optimizer::new(config.clone())?;
    let files = discover_files(directory)?;

    info!(
        "Optimizing {:?}: {} entries, max width {}px, quality {}{}",
        directory,
        files.len(),
        config.max_width,
        config.quality,
        if config.dry_run { " (dry run)" } else { "" }
    );

    let mut report = BatchReport::new(directory.to_path_buf(), config.dry_run);

    for path in &files {
        let outcome = optimizer.optimize_file(path);
        let file_report = FileReport {
            file_name: display_name(path),
            outcome,
            dry_run: config.dry_run,
        };
        debug!("{}: {:?}", file_report.file_name, file_report.outcome);

        on_file(&file_report);
        report.record(file_report);
    }

    report.finish(start_time.elapsed());

    info!(
        "Batch complete in {:.2}s: {} resized, {} re-encoded, {} skipped, {} failed",
        report.elapsed_ms as f64 / 1000.0,
        report.resized,
        report.optimized_only,
        report.skipped,
        report.failed
    );

    Ok(report)
}
