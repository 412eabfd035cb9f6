//! JWalk-based streaming directory scanner.

use std::path::Path;
use std::time::Instant;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use recsize_core::{
    Aggregator, BinTable, ScanConfig, ScanError, ScanStats, ScanSummary, ScanWarning, WarningKind,
};

use crate::inode::{InodeInfo, InodeTracker};
use crate::progress::{ProgressTracker, ScanProgress};

/// Files between progress broadcasts.
const PROGRESS_INTERVAL: u64 = 1000;

/// Scanner that streams every regular file's size into an [`Aggregator`].
///
/// Traversal runs on jwalk's rayon pool, but entries are consumed through a
/// single iterator so the aggregator has exactly one writer. Nothing per file
/// is retained except hardlink identities.
pub struct JwalkScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan the configured root and aggregate file sizes against `bins`.
    pub fn scan(&self, config: &ScanConfig, bins: &BinTable) -> Result<ScanSummary, ScanError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let root_metadata =
            std::fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        let root_device = get_dev(&root_metadata);
        let ignore = build_ignore_set(&config.ignore_patterns)?;

        debug!(root = %root_path.display(), bins = bins.len(), "starting scan");

        let mut aggregator = Aggregator::new(bins.clone());
        let mut stats = ScanStats::new();
        let mut warnings = Vec::new();
        let mut tracker = ProgressTracker::new();
        let inode_tracker = InodeTracker::new();
        let mut truncated = false;

        for entry_result in self.walker(config, &root_path, ignore) {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::from_io(path, io, WarningKind::ReadError),
                        None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
                    };
                    warn!(path = %warning.path.display(), "{}", warning.message);
                    warnings.push(warning);
                    tracker.record_error();
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            let depth = entry.depth() as u32;

            if file_type.is_symlink() {
                stats.record_symlink();
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::from_io(&path, io, WarningKind::MetadataError),
                        None => {
                            ScanWarning::new(&path, err.to_string(), WarningKind::MetadataError)
                        }
                    };
                    warn!(path = %path.display(), "{}", warning.message);
                    warnings.push(warning);
                    tracker.record_error();
                    continue;
                }
            };

            if !config.cross_filesystems && get_dev(&metadata) != root_device {
                continue;
            }

            if file_type.is_dir() {
                if depth > 0 {
                    stats.record_dir(depth);
                    tracker.record_dir();
                }
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            if config.dedupe_hardlinks
                && get_nlink(&metadata) > 1
                && !inode_tracker.track(InodeInfo::new(get_ino(&metadata), get_dev(&metadata)))
            {
                stats.record_hardlink_skip();
                continue;
            }

            if config.file_limit.is_some_and(|limit| tracker.files_scanned() >= limit) {
                truncated = true;
                break;
            }

            let size = metadata.len();
            aggregator.observe_len(size);
            stats.record_file(&path, size, depth);
            tracker.record_file(size);

            if tracker.files_scanned() % PROGRESS_INTERVAL == 0 {
                let _ = self.progress_tx.send(tracker.snapshot(&path));
            }
        }

        let _ = self.progress_tx.send(tracker.snapshot(&root_path));

        let state = aggregator.finish();
        let scan_duration = start.elapsed();

        info!(
            files = state.total_files(),
            bytes = state.total_bytes(),
            dirs = stats.total_dirs,
            warnings = warnings.len(),
            truncated,
            elapsed_ms = scan_duration.as_millis() as u64,
            "scan complete"
        );

        Ok(ScanSummary::new(
            state,
            root_path,
            config.clone(),
            stats,
            scan_duration,
            warnings,
        )
        .with_truncated(truncated))
    }

    /// Build the jwalk iterator, pruning ignored entries before descent.
    fn walker(&self, config: &ScanConfig, root_path: &Path, ignore: GlobSet) -> WalkDir {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX));

        if ignore.is_empty() {
            return walker;
        }

        walker.process_read_dir(move |_depth, _path, _state, children| {
            children.retain(|child| match child {
                Ok(entry) => !ignore.is_match(Path::new(entry.file_name())),
                Err(_) => true,
            });
        })
    }
}

impl Default for JwalkScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile ignore patterns into a single matcher.
fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
            message: format!("invalid ignore pattern {pattern:?}: {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ScanError::InvalidConfig {
        message: e.to_string(),
    })
}

// Cross-platform metadata helpers

/// Get the device ID from metadata.
#[cfg(unix)]
fn get_dev(metadata: &std::fs::Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
fn get_dev(_metadata: &std::fs::Metadata) -> u64 {
    0
}

/// Get the inode number from metadata.
#[cfg(unix)]
fn get_ino(metadata: &std::fs::Metadata) -> u64 {
    metadata.ino()
}

#[cfg(not(unix))]
fn get_ino(_metadata: &std::fs::Metadata) -> u64 {
    0
}

/// Get the number of hard links from metadata.
#[cfg(unix)]
fn get_nlink(metadata: &std::fs::Metadata) -> u64 {
    metadata.nlink()
}

#[cfg(not(unix))]
fn get_nlink(_metadata: &std::fs::Metadata) -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use recsize_core::BinSlot;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), vec![0u8; 4096]).unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), vec![0u8; 131_072]).unwrap();
        fs::write(root.join("dir2/file4.txt"), vec![0u8; 3000]).unwrap();
        fs::write(root.join("dir2/empty"), "").unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());

        let summary = JwalkScanner::new().scan(&config, &BinTable::standard()).unwrap();

        assert_eq!(summary.total_files(), 5);
        assert_eq!(summary.total_size(), 5 + 4096 + 131_072 + 3000);
        assert_eq!(summary.stats.total_dirs, 3);
        assert!(!summary.truncated);

        let state = &summary.state;
        assert_eq!(state.tally(BinSlot::Bin(0)).count, 2); // "hello" and the empty file
        assert_eq!(state.tally(BinSlot::Bin(3)).count, 2); // 3000 and 4096
        assert_eq!(state.tally(BinSlot::Bin(8)).count, 1); // exactly 128K
    }

    #[test]
    fn test_ignore_patterns_prune_directories() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .ignore_patterns(vec!["dir2".to_string(), "*.tmp".to_string()])
            .build()
            .unwrap();
        fs::write(temp.path().join("scratch.tmp"), "xxxx").unwrap();

        let summary = JwalkScanner::new().scan(&config, &BinTable::standard()).unwrap();

        // dir2/file4.txt, dir2/empty and scratch.tmp are excluded
        assert_eq!(summary.total_files(), 3);
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .ignore_patterns(vec!["a[".to_string()])
            .build()
            .unwrap();

        let err = JwalkScanner::new()
            .scan(&config, &BinTable::standard())
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig { .. }));
    }

    #[test]
    fn test_file_limit_truncates() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .file_limit(Some(2u64))
            .build()
            .unwrap();

        let summary = JwalkScanner::new().scan(&config, &BinTable::standard()).unwrap();
        assert_eq!(summary.total_files(), 2);
        assert!(summary.truncated);

        let counted: u64 = summary.state.slots().map(|(_, t)| t.count).sum();
        assert_eq!(counted, 2);
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path().join("file1.txt"));
        let err = JwalkScanner::new()
            .scan(&config, &BinTable::standard())
            .unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let config = ScanConfig::new(temp.path().join("nope"));
        let err = JwalkScanner::new()
            .scan(&config, &BinTable::standard())
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_empty_directory_yields_empty_state() {
        let temp = TempDir::new().unwrap();
        let summary = JwalkScanner::new()
            .scan(&ScanConfig::new(temp.path()), &BinTable::standard())
            .unwrap();
        assert!(summary.state.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_hardlinks_counted_once() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("original");
        fs::write(&original, vec![1u8; 10_000]).unwrap();
        fs::hard_link(&original, temp.path().join("link")).unwrap();

        let scanner = JwalkScanner::new();
        let summary = scanner
            .scan(&ScanConfig::new(temp.path()), &BinTable::standard())
            .unwrap();
        assert_eq!(summary.total_files(), 1);
        assert_eq!(summary.stats.hardlinks_skipped, 1);

        let config = ScanConfig::builder()
            .root(temp.path())
            .dedupe_hardlinks(false)
            .build()
            .unwrap();
        let summary = scanner.scan(&config, &BinTable::standard()).unwrap();
        assert_eq!(summary.total_files(), 2);
    }
}
