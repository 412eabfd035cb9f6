//! Byte-weighted cumulative distribution over the bins.
//!
//! Percentiles here are computed over cumulative *bytes*, not file counts: a
//! handful of huge files can own the upper percentiles even when they are a
//! tiny share of the population. That is the point, since block size should
//! follow where the data volume lives.

use recsize_core::{AggregateState, BinSlot, fraction};

/// Cumulative distribution view over a sealed [`AggregateState`].
#[derive(Debug, Clone, Copy)]
pub struct Cdf<'a> {
    state: &'a AggregateState,
}

impl<'a> Cdf<'a> {
    /// Wrap a sealed state.
    pub fn new(state: &'a AggregateState) -> Self {
        Self { state }
    }

    /// Bytes in every slot up to and including `slot`.
    pub fn cumulative_bytes(&self, slot: BinSlot) -> u64 {
        self.state
            .slots()
            .take_while(|(s, _)| *s <= slot)
            .fold(0u64, |acc, (_, t)| acc.saturating_add(t.bytes))
    }

    /// Files in every slot up to and including `slot`.
    pub fn cumulative_count(&self, slot: BinSlot) -> u64 {
        self.state
            .slots()
            .take_while(|(s, _)| *s <= slot)
            .map(|(_, t)| t.count)
            .sum()
    }

    /// Share of all bytes held at or below `slot`; 0 when there are no bytes.
    pub fn cumulative_fraction(&self, slot: BinSlot) -> f64 {
        fraction(self.cumulative_bytes(slot), self.state.total_bytes())
    }

    /// Share of all files at or below `slot`; 0 when there are no files.
    pub fn cumulative_count_fraction(&self, slot: BinSlot) -> f64 {
        fraction(self.cumulative_count(slot), self.state.total_files())
    }

    /// First slot whose cumulative byte fraction reaches `threshold`.
    ///
    /// Scans regular bins in ascending order and falls back to
    /// [`BinSlot::Overflow`] when none qualifies. With no bytes at all every
    /// observed file is zero-sized and therefore in bin 0, which is returned.
    pub fn find_percentile(&self, threshold: f64) -> BinSlot {
        let total = self.state.total_bytes();
        if total == 0 {
            return BinSlot::Bin(0);
        }

        let mut cumulative = 0u64;
        for (i, tally) in self.state.tallies().iter().enumerate() {
            cumulative = cumulative.saturating_add(tally.bytes);
            if fraction(cumulative, total) >= threshold {
                return BinSlot::Bin(i);
            }
        }
        BinSlot::Overflow
    }
}
