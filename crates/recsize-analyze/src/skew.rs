//! Count-versus-bytes skew detection.
//!
//! A tree is skewed when most *files* are small while most *bytes* sit in
//! large files. No single recordsize serves both populations, so the
//! recommender protects the write-heavy tiers and proposes a dataset split.

use derive_builder::Builder;
use serde::Serialize;
use tracing::debug;

use recsize_core::{AggregateState, BinSlot, fraction};

/// Upper bound (inclusive) of the "small" bins: 64 KiB.
pub const DEFAULT_SMALL_MAX: u64 = 64 * 1024;

/// Lower bound (exclusive) of the "large" bins: 1 MiB.
pub const DEFAULT_LARGE_MIN: u64 = 1024 * 1024;

/// Rule deciding whether the measured fractions amount to skew.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum SkewPolicy {
    /// Small files dominate by count AND large files dominate by bytes.
    CdfJoint {
        small_count_fraction: f64,
        large_byte_fraction: f64,
    },
    /// Small files dominate by count and there are at least `min_small_files` of them.
    ///
    /// Ignores byte share entirely; select it explicitly when that is wanted.
    CountFloor {
        small_count_fraction: f64,
        min_small_files: u64,
    },
}

impl SkewPolicy {
    /// The 60% count / 80% bytes joint rule.
    pub const fn cdf_joint() -> Self {
        Self::CdfJoint {
            small_count_fraction: 0.60,
            large_byte_fraction: 0.80,
        }
    }

    /// The 40% count rule with an absolute floor of 5000 small files.
    pub const fn count_floor() -> Self {
        Self::CountFloor {
            small_count_fraction: 0.40,
            min_small_files: 5000,
        }
    }

    fn is_skewed(
        &self,
        small_count_fraction: f64,
        large_byte_fraction: f64,
        small_files: u64,
    ) -> bool {
        match *self {
            Self::CdfJoint {
                small_count_fraction: count_limit,
                large_byte_fraction: byte_limit,
            } => small_count_fraction > count_limit && large_byte_fraction > byte_limit,
            Self::CountFloor {
                small_count_fraction: count_limit,
                min_small_files,
            } => small_count_fraction > count_limit && small_files >= min_small_files,
        }
    }
}

impl Default for SkewPolicy {
    fn default() -> Self {
        Self::cdf_joint()
    }
}

/// Configuration for skew detection.
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SkewConfig {
    /// Bins with a threshold at or below this are "small".
    #[builder(default = "DEFAULT_SMALL_MAX")]
    pub small_max_threshold: u64,

    /// Bins with a threshold above this, plus overflow, are "large".
    #[builder(default = "DEFAULT_LARGE_MIN")]
    pub large_min_threshold: u64,

    /// Decision rule.
    #[builder(default)]
    pub policy: SkewPolicy,
}

impl SkewConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let small = self.small_max_threshold.unwrap_or(DEFAULT_SMALL_MAX);
        let large = self.large_min_threshold.unwrap_or(DEFAULT_LARGE_MIN);
        if small >= large {
            return Err(format!(
                "small threshold ({small}) must be below large threshold ({large})"
            ));
        }
        Ok(())
    }
}

impl Default for SkewConfig {
    fn default() -> Self {
        Self {
            small_max_threshold: DEFAULT_SMALL_MAX,
            large_min_threshold: DEFAULT_LARGE_MIN,
            policy: SkewPolicy::default(),
        }
    }
}

impl SkewConfig {
    /// Create a new config builder.
    pub fn builder() -> SkewConfigBuilder {
        SkewConfigBuilder::default()
    }

    /// Default thresholds with a different policy.
    pub fn with_policy(policy: SkewPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

/// Outcome of skew detection.
#[derive(Debug, Clone, Serialize)]
pub struct SkewReport {
    /// Whether the policy flagged skew.
    pub is_skewed: bool,
    /// Files in small bins / all files.
    pub small_count_fraction: f64,
    /// Bytes in large bins and overflow / all bytes.
    pub large_byte_fraction: f64,
    /// Files in small bins.
    pub small_file_count: u64,
    /// Bytes in large bins and overflow.
    pub large_bytes: u64,
    /// Small bin holding the most files (lowest threshold wins ties).
    pub modal_small_bin: Option<usize>,
    /// Policy that produced the verdict.
    pub policy: SkewPolicy,
}

/// Detects count-versus-bytes skew.
#[derive(Debug, Clone, Default)]
pub struct SkewDetector {
    config: SkewConfig,
}

impl SkewDetector {
    /// Create a new detector with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new detector with custom config.
    pub fn with_config(config: SkewConfig) -> Self {
        Self { config }
    }

    /// Evaluate a sealed state.
    pub fn detect(&self, state: &AggregateState) -> SkewReport {
        let bins = state.bins();
        let mut small_file_count = 0u64;
        let mut large_bytes = state.overflow().bytes;
        let mut modal: Option<(usize, u64)> = None;

        for (i, tally) in state.tallies().iter().enumerate() {
            let threshold = bins.threshold(i).unwrap_or(u64::MAX);
            if threshold <= self.config.small_max_threshold {
                small_file_count += tally.count;
                if tally.count > 0 && modal.is_none_or(|(_, best)| tally.count > best) {
                    modal = Some((i, tally.count));
                }
            } else if threshold > self.config.large_min_threshold {
                large_bytes = large_bytes.saturating_add(tally.bytes);
            }
        }

        let small_count_fraction = fraction(small_file_count, state.total_files());
        let large_byte_fraction = fraction(large_bytes, state.total_bytes());
        let is_skewed =
            self.config
                .policy
                .is_skewed(small_count_fraction, large_byte_fraction, small_file_count);

        debug!(
            small_count_fraction,
            large_byte_fraction,
            is_skewed,
            modal_small_bin = ?modal.map(|(i, _)| bins.label(BinSlot::Bin(i))),
            "skew evaluated"
        );

        SkewReport {
            is_skewed,
            small_count_fraction,
            large_byte_fraction,
            small_file_count,
            large_bytes,
            modal_small_bin: modal.map(|(i, _)| i),
            policy: self.config.policy,
        }
    }
}
