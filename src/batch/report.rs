//! Per-file report lines and batch totals

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::processing::{FileOutcome, SkipReason};

/// Outcome of one directory entry, keyed by its file name
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    #[serde(skip)]
    pub dry_run: bool,
}

impl FileReport {
    /// Console lines for this entry; empty for skipped entries
    pub fn log_lines(&self) -> Vec<String> {
        let name = &self.file_name;
        match (&self.outcome, self.dry_run) {
            (FileOutcome::Skipped { .. }, _) => Vec::new(),
            (FileOutcome::Resized { to, .. }, false) => {
                vec![format!("Resized {} to {}", name, to), format!("Optimized {}", name)]
            }
            (FileOutcome::Resized { to, .. }, true) => vec![
                format!("Would resize {} to {}", name, to),
                format!("Would optimize {}", name),
            ],
            (FileOutcome::OptimizedOnly { .. }, false) => vec![format!("Optimized {}", name)],
            (FileOutcome::OptimizedOnly { .. }, true) => vec![format!("Would optimize {}", name)],
            (FileOutcome::Failed { reason, resized_to }, _) => {
                let error = format!("Error processing {}: {}", name, reason);
                match resized_to {
                    Some(to) => vec![format!("Resized {} to {}", name, to), error],
                    None => vec![error],
                }
            }
        }
    }
}

/// Totals for one batch pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub directory: PathBuf,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub resized: u32,
    pub optimized_only: u32,
    pub skipped: u32,
    pub failed: u32,
    pub total_input_size: u64,
    pub total_output_size: u64,
    pub elapsed_ms: u64,
}

impl BatchReport {
    pub fn new(directory: PathBuf, dry_run: bool) -> Self {
        Self {
            directory,
            dry_run,
            ..Self::default()
        }
    }

    /// Add one entry to the totals
    pub fn record(&mut self, file: FileReport) {
        match &file.outcome {
            FileOutcome::Resized { .. } => self.resized += 1,
            FileOutcome::OptimizedOnly { .. } => self.optimized_only += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }

        if let Some((before, after)) = file.outcome.sizes() {
            self.total_input_size += before;
            self.total_output_size += after.unwrap_or(before);
        }

        self.files.push(file);
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    /// Files that were resized or re-encoded
    pub fn processed(&self) -> u32 {
        self.resized + self.optimized_only
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Entries skipped because their name is not a supported image
    pub fn non_images(&self) -> usize {
        self.files
            .iter()
            .filter(|f| {
                matches!(
                    f.outcome,
                    FileOutcome::Skipped {
                        reason: SkipReason::NotAnImage
                    }
                )
            })
            .count()
    }

    /// Get size reduction percentage over all processed files
    pub fn size_reduction(&self) -> f64 {
        if self.total_input_size == 0 {
            return 0.0;
        }
        let reduction = self.total_input_size.saturating_sub(self.total_output_size);
        (reduction as f64 / self.total_input_size as f64) * 100.0
    }
}
