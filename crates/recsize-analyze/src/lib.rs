//! Recordsize analysis for recsize.
//!
//! Turns a sealed size distribution into recordsize recommendations:
//!
//! - **Byte-weighted CDF** - find the bin where a given share of bytes is reached
//! - **Skew detection** - flag trees where file count and byte volume disagree
//! - **Recommendations** - sequential-write, mixed and sequential-read tiers,
//!   collapsed to one value when they agree, plus a dataset split when skewed
//! - **Reference table** - static hints for random-I/O workloads
//!
//! # Example
//!
//! ```rust
//! use recsize_analyze::{Recommender, Report};
//! use recsize_core::{Aggregator, BinTable};
//!
//! let mut aggregator = Aggregator::new(BinTable::standard());
//! for size in [500, 500, 2 << 20, 2 << 20] {
//!     aggregator.observe(size).unwrap();
//! }
//!
//! match Recommender::new().recommend(&aggregator.finish()) {
//!     Report::Empty => println!("No files found"),
//!     Report::Analyzed(analysis) => {
//!         for (tier, recordsize) in analysis.verdict.outputs() {
//!             match tier {
//!                 Some(tier) => println!("{tier}: {recordsize}"),
//!                 None => println!("recordsize={recordsize}"),
//!             }
//!         }
//!     }
//! }
//! ```

mod distribution;
pub mod percentile;
mod recommend;
mod reference;
pub mod skew;

pub use distribution::{BinRow, bin_rows};
pub use percentile::Cdf;
pub use recommend::{
    Analysis, RecommendConfig, RecommendConfigBuilder, Recommender, Report, SplitSuggestion,
    Tier, TierRecommendation, Verdict,
};
pub use reference::{ReferenceWorkload, reference_table};
pub use skew::{SkewConfig, SkewConfigBuilder, SkewDetector, SkewPolicy, SkewReport};

// Re-export core types
pub use recsize_core::{AggregateState, Aggregator, BinSlot, BinTable, Recordsize};
