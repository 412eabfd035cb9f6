//! Streaming directory traversal for recsize.
//!
//! This crate walks a directory tree with jwalk and feeds each regular
//! file's size straight into a [`recsize_core::Aggregator`]. No per-file
//! records are kept, so memory stays flat however many files the tree holds.
//!
//! - **Parallel traversal** via jwalk/rayon, consumed through one iterator
//! - **Progress updates** via broadcast channels
//! - **Hardlink detection** so linked files are sampled once
//! - **Glob ignore patterns** pruned before descent
//!
//! # Example
//!
//! ```rust,no_run
//! use recsize_scan::{BinTable, JwalkScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let summary = JwalkScanner::new().scan(&config, &BinTable::standard()).unwrap();
//!
//! println!("Total size: {} bytes", summary.total_size());
//! println!("Total files: {}", summary.total_files());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use recsize_scan::JwalkScanner;
//!
//! let scanner = JwalkScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         eprintln!("Scanned {} files", progress.files_scanned);
//!     }
//! });
//! ```

mod inode;
mod progress;
mod scanner;

pub use inode::{InodeInfo, InodeTracker};
pub use progress::ScanProgress;
pub use scanner::JwalkScanner;

// Re-export core types for convenience
pub use recsize_core::{
    AggregateState, BinTable, ScanConfig, ScanError, ScanStats, ScanSummary, ScanWarning,
    WarningKind,
};
