//! Scan result container and traversal statistics.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::config::ScanConfig;
use crate::error::ScanWarning;
use crate::histogram::AggregateState;

/// Traversal statistics that do not feed the size distribution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    /// Directories visited.
    pub total_dirs: u64,
    /// Symbolic links seen (never followed unless configured).
    pub total_symlinks: u64,
    /// Hardlinks skipped because their inode was already counted.
    pub hardlinks_skipped: u64,
    /// Maximum depth reached.
    pub max_depth: u32,
    /// Largest file (path, size).
    pub largest_file: Option<(PathBuf, u64)>,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a regular file.
    pub fn record_file(&mut self, path: &std::path::Path, size: u64, depth: u32) {
        self.max_depth = self.max_depth.max(depth);
        if self.largest_file.as_ref().is_none_or(|(_, s)| size > *s) {
            self.largest_file = Some((path.to_path_buf(), size));
        }
    }

    /// Record a directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.total_dirs += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a symlink.
    pub fn record_symlink(&mut self) {
        self.total_symlinks += 1;
    }

    /// Record a hardlink whose inode was already counted.
    pub fn record_hardlink_skip(&mut self) {
        self.hardlinks_skipped += 1;
    }
}

/// Sealed size distribution of a scanned tree plus traversal context.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Size distribution of all regular files.
    pub state: AggregateState,

    /// Root path that was scanned.
    pub root_path: PathBuf,

    /// When this scan was performed.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Scan configuration used.
    pub config: ScanConfig,

    /// Traversal statistics.
    pub stats: ScanStats,

    /// True when the scan stopped at the configured file limit.
    pub truncated: bool,

    /// Warnings encountered during scan.
    pub warnings: Vec<ScanWarning>,
}

impl ScanSummary {
    /// Create a new scan summary.
    pub fn new(
        state: AggregateState,
        root_path: PathBuf,
        config: ScanConfig,
        stats: ScanStats,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            state,
            root_path,
            scanned_at: SystemTime::now(),
            scan_duration,
            config,
            stats,
            truncated: false,
            warnings,
        }
    }

    /// Mark the summary as covering only a prefix of the tree.
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    /// Get the total number of files.
    pub fn total_files(&self) -> u64 {
        self.state.total_files()
    }

    /// Get the total size of all files.
    pub fn total_size(&self) -> u64 {
        self.state.total_bytes()
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
