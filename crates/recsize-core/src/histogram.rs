//! Streaming size histogram.
//!
//! [`Aggregator`] folds a stream of file sizes into per-bin counters in a
//! single pass. Memory is proportional to the number of bins; individual
//! sizes are never stored. The resulting [`AggregateState`] is identical for
//! any permutation of the same input.

use serde::Serialize;

use crate::bins::{BinSlot, BinTable};
use crate::error::AnalysisError;

/// Count and byte total for one bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BinTally {
    /// Number of files routed to the bin.
    pub count: u64,
    /// Sum of their sizes.
    pub bytes: u64,
}

impl BinTally {
    fn add(&mut self, size: u64) {
        self.count += 1;
        self.bytes = self.bytes.saturating_add(size);
    }
}

/// Sealed result of one pass over the size stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateState {
    bins: BinTable,
    total_files: u64,
    total_bytes: u64,
    tallies: Vec<BinTally>,
    overflow: BinTally,
}

impl AggregateState {
    fn new(bins: BinTable) -> Self {
        let tallies = vec![BinTally::default(); bins.len()];
        Self {
            bins,
            total_files: 0,
            total_bytes: 0,
            tallies,
            overflow: BinTally::default(),
        }
    }

    /// The bin table this state was built against.
    pub fn bins(&self) -> &BinTable {
        &self.bins
    }

    /// Number of files observed.
    pub fn total_files(&self) -> u64 {
        self.total_files
    }

    /// Sum of all observed sizes.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Per-bin tallies, one per threshold, ascending.
    pub fn tallies(&self) -> &[BinTally] {
        &self.tallies
    }

    /// Tally for sizes above the last threshold.
    pub fn overflow(&self) -> BinTally {
        self.overflow
    }

    /// Tally for any slot, including overflow.
    pub fn tally(&self, slot: BinSlot) -> BinTally {
        match slot {
            BinSlot::Bin(i) => self.tallies.get(i).copied().unwrap_or_default(),
            BinSlot::Overflow => self.overflow,
        }
    }

    /// Every slot in ascending order: regular bins followed by overflow.
    pub fn slots(&self) -> impl Iterator<Item = (BinSlot, BinTally)> + '_ {
        self.tallies
            .iter()
            .enumerate()
            .map(|(i, t)| (BinSlot::Bin(i), *t))
            .chain(std::iter::once((BinSlot::Overflow, self.overflow)))
    }

    /// True when no files were observed.
    pub fn is_empty(&self) -> bool {
        self.total_files == 0
    }

    /// Surface the empty-dataset condition as an error.
    pub fn require_data(&self) -> Result<&Self, AnalysisError> {
        if self.is_empty() {
            Err(AnalysisError::EmptyDataset)
        } else {
            Ok(self)
        }
    }

    /// Files in the bin as a fraction of all files (0 when empty).
    pub fn count_fraction(&self, slot: BinSlot) -> f64 {
        fraction(self.tally(slot).count, self.total_files)
    }

    /// Bytes in the bin as a fraction of all bytes (0 when no bytes).
    pub fn byte_fraction(&self, slot: BinSlot) -> f64 {
        fraction(self.tally(slot).bytes, self.total_bytes)
    }
}

/// `part / whole`, defined as 0 when `whole` is 0.
pub fn fraction(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Single-pass accumulator over a size stream.
#[derive(Debug, Clone)]
pub struct Aggregator {
    state: AggregateState,
}

impl Aggregator {
    /// Create an aggregator over the given bin table.
    pub fn new(bins: BinTable) -> Self {
        Self {
            state: AggregateState::new(bins),
        }
    }

    /// Observe one size from an untrusted source.
    ///
    /// Zero is valid and lands in bin 0; negative sizes are rejected and
    /// leave the state untouched.
    pub fn observe(&mut self, size: i64) -> Result<(), AnalysisError> {
        let size = u64::try_from(size).map_err(|_| AnalysisError::InvalidSample { size })?;
        self.observe_len(size);
        Ok(())
    }

    /// Observe one size known to be non-negative.
    pub fn observe_len(&mut self, size: u64) {
        let state = &mut self.state;
        match state.bins.assign(size) {
            BinSlot::Bin(i) => state.tallies[i].add(size),
            BinSlot::Overflow => state.overflow.add(size),
        }
        state.total_files += 1;
        state.total_bytes = state.total_bytes.saturating_add(size);
    }

    /// Read-only view of the state accumulated so far.
    ///
    /// Every prefix of the stream yields a consistent state, so a caller that
    /// stops early can still analyze this.
    pub fn snapshot(&self) -> &AggregateState {
        &self.state
    }

    /// Seal the stream.
    pub fn finish(self) -> AggregateState {
        self.state
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(BinTable::standard())
    }
}

impl Extend<u64> for Aggregator {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, sizes: I) {
        for size in sizes {
            self.observe_len(size);
        }
    }
}

impl FromIterator<u64> for AggregateState {
    fn from_iter<I: IntoIterator<Item = u64>>(sizes: I) -> Self {
        let mut aggregator = Aggregator::default();
        aggregator.extend(sizes);
        aggregator.finish()
    }
}
