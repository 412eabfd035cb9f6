//! Core types for recsize.
//!
//! This crate provides the pieces every other recsize crate shares: the
//! fixed bin table, the recordsize ladder, the streaming size aggregator,
//! scan configuration and error types.

mod bins;
mod config;
mod error;
mod histogram;
mod recordsize;
mod summary;

pub use bins::{BinSlot, BinTable, DEFAULT_THRESHOLDS, format_threshold};
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{AnalysisError, ScanError, ScanWarning, WarningKind};
pub use histogram::{AggregateState, Aggregator, BinTally, fraction};
pub use recordsize::Recordsize;
pub use summary::{ScanStats, ScanSummary};
