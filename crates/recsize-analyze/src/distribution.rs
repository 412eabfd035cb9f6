//! Per-bin table rows for rendering histograms.

use serde::Serialize;

use recsize_core::{AggregateState, BinSlot, Recordsize, fraction};

/// One row of the size distribution, in percent.
#[derive(Debug, Clone, Serialize)]
pub struct BinRow {
    /// Slot this row describes.
    pub slot: BinSlot,
    /// Compact label (`4K`, `1M`, `>1G`).
    pub label: String,
    /// Upper bound in bytes; `None` for overflow.
    pub threshold: Option<u64>,
    /// Files in the bin.
    pub count: u64,
    /// Bytes in the bin.
    pub bytes: u64,
    /// Share of all files.
    pub count_pct: f64,
    /// Share of all bytes.
    pub byte_pct: f64,
    /// Share of all files at or below this bin.
    pub cumulative_count_pct: f64,
    /// Share of all bytes at or below this bin.
    pub cumulative_byte_pct: f64,
    /// Recordsize this bin maps to.
    pub recordsize: Recordsize,
}

/// Build the full table: one row per regular bin, plus overflow when populated.
pub fn bin_rows(state: &AggregateState) -> Vec<BinRow> {
    let bins = state.bins();
    let mut rows = Vec::with_capacity(bins.len() + 1);
    let mut cumulative_count = 0u64;
    let mut cumulative_bytes = 0u64;

    for (slot, tally) in state.slots() {
        if slot.is_overflow() && tally.count == 0 {
            continue;
        }
        cumulative_count += tally.count;
        cumulative_bytes = cumulative_bytes.saturating_add(tally.bytes);

        rows.push(BinRow {
            slot,
            label: bins.label(slot),
            threshold: slot.index().and_then(|i| bins.threshold(i)),
            count: tally.count,
            bytes: tally.bytes,
            count_pct: percent(tally.count, state.total_files()),
            byte_pct: percent(tally.bytes, state.total_bytes()),
            cumulative_count_pct: percent(cumulative_count, state.total_files()),
            cumulative_byte_pct: percent(cumulative_bytes, state.total_bytes()),
            recordsize: Recordsize::from_slot(bins, slot),
        });
    }
    rows
}

fn percent(part: u64, whole: u64) -> f64 {
    fraction(part, whole) * 100.0
}
