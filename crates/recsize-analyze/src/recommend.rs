//! Recordsize recommendations per workload tier.
//!
//! Each tier reads the byte-weighted CDF at its own percentile and maps the
//! resulting bin onto the recordsize ladder. Skew then pins the write-heavy
//! tiers to conservative values; sequential reads never pay a
//! read-modify-write penalty and keep their computed size.

use derive_builder::Builder;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::debug;

use recsize_core::{AggregateState, BinSlot, Recordsize};

use crate::distribution::{BinRow, bin_rows};
use crate::percentile::Cdf;
use crate::reference::{ReferenceWorkload, reference_table};
use crate::skew::{SkewConfig, SkewDetector, SkewReport};

/// Workload shape a recommendation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Streaming writes; sized at the byte median.
    SequentialWrite,
    /// Mixed reads and writes.
    Mixed,
    /// Streaming reads; sized toward the largest files.
    SequentialRead,
}

/// Configuration for the recommendation engine.
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RecommendConfig {
    /// Byte percentile for the sequential-write tier.
    #[builder(default = "0.50")]
    pub sequential_write_percentile: f64,

    /// Byte percentile for the mixed tier.
    #[builder(default = "0.70")]
    pub mixed_percentile: f64,

    /// Byte percentile for the sequential-read tier.
    #[builder(default = "0.90")]
    pub sequential_read_percentile: f64,

    /// Sequential-write recordsize forced when skew is detected.
    #[builder(default = "Recordsize::K128")]
    pub skewed_write_recordsize: Recordsize,

    /// Mixed recordsize forced when skew is detected.
    #[builder(default = "Recordsize::K256")]
    pub skewed_mixed_recordsize: Recordsize,

    /// Skew detection settings.
    #[builder(default)]
    pub skew: SkewConfig,
}

impl RecommendConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let write = self.sequential_write_percentile.unwrap_or(0.50);
        let mixed = self.mixed_percentile.unwrap_or(0.70);
        let read = self.sequential_read_percentile.unwrap_or(0.90);

        let tiers = [
            ("sequential-write", write),
            ("mixed", mixed),
            ("sequential-read", read),
        ];
        for (name, p) in tiers {
            if !(p > 0.0 && p < 1.0) {
                return Err(format!("{name} percentile must be in (0, 1), got {p}"));
            }
        }
        if write > mixed || mixed > read {
            return Err(
                "tier percentiles must be non-decreasing (write <= mixed <= read)".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            sequential_write_percentile: 0.50,
            mixed_percentile: 0.70,
            sequential_read_percentile: 0.90,
            skewed_write_recordsize: Recordsize::K128,
            skewed_mixed_recordsize: Recordsize::K256,
            skew: SkewConfig::default(),
        }
    }
}

impl RecommendConfig {
    /// Create a new config builder.
    pub fn builder() -> RecommendConfigBuilder {
        RecommendConfigBuilder::default()
    }

    /// Percentile driving a tier.
    pub fn percentile(&self, tier: Tier) -> f64 {
        match tier {
            Tier::SequentialWrite => self.sequential_write_percentile,
            Tier::Mixed => self.mixed_percentile,
            Tier::SequentialRead => self.sequential_read_percentile,
        }
    }

    /// Forced value for a tier under skew, if it has one.
    fn skew_override(&self, tier: Tier) -> Option<Recordsize> {
        match tier {
            Tier::SequentialWrite => Some(self.skewed_write_recordsize),
            Tier::Mixed => Some(self.skewed_mixed_recordsize),
            Tier::SequentialRead => None,
        }
    }
}

/// Recommendation for one tier and how it was reached.
#[derive(Debug, Clone, Serialize)]
pub struct TierRecommendation {
    /// Workload tier.
    pub tier: Tier,
    /// Byte percentile used.
    pub percentile: f64,
    /// Bin the percentile resolved to.
    pub slot: BinSlot,
    /// Label of that bin.
    pub bin_label: String,
    /// Share of all bytes at or below that bin.
    pub byte_share: f64,
    /// Recordsize the bin maps to.
    pub computed: Recordsize,
    /// Final recommendation after skew overrides.
    pub recordsize: Recordsize,
    /// True when skew replaced the computed value.
    pub overridden: bool,
}

/// What to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Verdict {
    /// Every tier agrees.
    Unified { recordsize: Recordsize },
    /// Tiers disagree.
    PerTier {
        sequential_write: Recordsize,
        mixed: Recordsize,
        sequential_read: Recordsize,
    },
}

impl Verdict {
    /// Recommendations to display: one when unified, three otherwise.
    pub fn outputs(&self) -> Vec<(Option<Tier>, Recordsize)> {
        match *self {
            Self::Unified { recordsize } => vec![(None, recordsize)],
            Self::PerTier {
                sequential_write,
                mixed,
                sequential_read,
            } => vec![
                (Some(Tier::SequentialWrite), sequential_write),
                (Some(Tier::Mixed), mixed),
                (Some(Tier::SequentialRead), sequential_read),
            ],
        }
    }
}

/// Suggested two-dataset layout for a skewed tree.
#[derive(Debug, Clone, Serialize)]
pub struct SplitSuggestion {
    /// Recordsize for the dataset holding the large files.
    pub large_files: Recordsize,
    /// Recordsize for the dataset holding the small files.
    pub small_files: Recordsize,
    /// Most populated small bin, which `small_files` is sized from.
    pub small_bin_label: String,
}

/// Full analysis of a non-empty tree.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Files analyzed.
    pub total_files: u64,
    /// Bytes analyzed.
    pub total_bytes: u64,
    /// One entry per tier, in tier order.
    pub tiers: Vec<TierRecommendation>,
    /// Collapsed or per-tier verdict.
    pub verdict: Verdict,
    /// Skew detection outcome.
    pub skew: SkewReport,
    /// Dataset split, present only when skewed.
    pub split: Option<SplitSuggestion>,
    /// Per-bin distribution.
    pub bins: Vec<BinRow>,
    /// Static random-I/O hints.
    pub reference: &'static [ReferenceWorkload],
}

impl Analysis {
    /// Recommendation for a tier.
    pub fn tier(&self, tier: Tier) -> Option<&TierRecommendation> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

/// Result of running the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "analysis", rename_all = "snake_case")]
pub enum Report {
    /// No files were observed; nothing to recommend.
    Empty,
    /// Recommendations for a populated tree.
    Analyzed(Box<Analysis>),
}

impl Report {
    /// Check if this is the empty-dataset report.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The analysis, if there was data.
    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            Self::Empty => None,
            Self::Analyzed(analysis) => Some(analysis),
        }
    }
}

/// The recommendation engine.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    config: RecommendConfig,
}

impl Recommender {
    /// Create a new engine with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new engine with custom config.
    pub fn with_config(config: RecommendConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Produce recommendations for a sealed state.
    pub fn recommend(&self, state: &AggregateState) -> Report {
        if state.is_empty() {
            debug!("empty dataset, skipping analysis");
            return Report::Empty;
        }

        let bins = state.bins();
        let cdf = Cdf::new(state);
        let skew = SkewDetector::with_config(self.config.skew.clone()).detect(state);

        let tiers: Vec<TierRecommendation> = Tier::iter()
            .map(|tier| {
                let percentile = self.config.percentile(tier);
                let slot = cdf.find_percentile(percentile);
                let computed = Recordsize::from_slot(bins, slot);
                let forced = self.config.skew_override(tier).filter(|_| skew.is_skewed);

                debug!(
                    %tier,
                    percentile,
                    bin = %bins.label(slot),
                    %computed,
                    ?forced,
                    "tier resolved"
                );

                TierRecommendation {
                    tier,
                    percentile,
                    slot,
                    bin_label: bins.label(slot),
                    byte_share: cdf.cumulative_fraction(slot),
                    computed,
                    recordsize: forced.unwrap_or(computed),
                    overridden: forced.is_some_and(|f| f != computed),
                }
            })
            .collect();

        let verdict = verdict_for(&tiers);

        let split = skew
            .modal_small_bin
            .filter(|_| skew.is_skewed)
            .map(|index| SplitSuggestion {
                large_files: Recordsize::MAX,
                small_files: Recordsize::from_slot(bins, BinSlot::Bin(index)),
                small_bin_label: bins.label(BinSlot::Bin(index)),
            });

        Report::Analyzed(Box::new(Analysis {
            total_files: state.total_files(),
            total_bytes: state.total_bytes(),
            tiers,
            verdict,
            skew,
            split,
            bins: bin_rows(state),
            reference: reference_table(),
        }))
    }
}

/// Collapse to a single recommendation when all tiers agree.
fn verdict_for(tiers: &[TierRecommendation]) -> Verdict {
    let pick = |tier: Tier| {
        tiers
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.recordsize)
            .unwrap_or(Recordsize::MAX)
    };
    let sequential_write = pick(Tier::SequentialWrite);
    let mixed = pick(Tier::Mixed);
    let sequential_read = pick(Tier::SequentialRead);

    if sequential_write == mixed && mixed == sequential_read {
        Verdict::Unified {
            recordsize: sequential_write,
        }
    } else {
        Verdict::PerTier {
            sequential_write,
            mixed,
            sequential_read,
        }
    }
}
