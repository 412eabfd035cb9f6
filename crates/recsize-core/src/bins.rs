//! Fixed byte-size bins used to bucket file sizes.

use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::AnalysisError;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Default bin thresholds: powers of two from 512 B to 1 GiB.
pub const DEFAULT_THRESHOLDS: [u64; 22] = [
    512,
    KIB,
    2 * KIB,
    4 * KIB,
    8 * KIB,
    16 * KIB,
    32 * KIB,
    64 * KIB,
    128 * KIB,
    256 * KIB,
    512 * KIB,
    MIB,
    2 * MIB,
    4 * MIB,
    8 * MIB,
    16 * MIB,
    32 * MIB,
    64 * MIB,
    128 * MIB,
    256 * MIB,
    512 * MIB,
    GIB,
];

/// Where a size lands in a [`BinTable`].
///
/// `Overflow` orders after every regular bin, so slots can be compared
/// directly when checking percentile monotonicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSlot {
    /// Regular bin at this index.
    Bin(usize),
    /// Sizes strictly greater than the last threshold.
    Overflow,
}

impl BinSlot {
    /// Index of a regular bin, `None` for the overflow tier.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Bin(i) => Some(i),
            Self::Overflow => None,
        }
    }

    /// Check if this is the overflow tier.
    pub fn is_overflow(self) -> bool {
        matches!(self, Self::Overflow)
    }
}

/// Ordered sequence of strictly increasing byte thresholds.
///
/// Bin `i` covers `(threshold[i-1], threshold[i]]`; bin 0 covers
/// `[0, threshold[0]]`. The table is read-only once built and is passed
/// explicitly to everything that needs bin boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinTable {
    thresholds: Cow<'static, [u64]>,
}

impl BinTable {
    /// The standard 22-bin table (512 B .. 1 GiB).
    pub fn standard() -> Self {
        Self {
            thresholds: Cow::Borrowed(&DEFAULT_THRESHOLDS),
        }
    }

    /// Build a custom table. Thresholds must be non-empty and strictly increasing.
    pub fn new(thresholds: Vec<u64>) -> Result<Self, AnalysisError> {
        if thresholds.is_empty() {
            return Err(AnalysisError::InvalidBinTable {
                message: "bin table must contain at least one threshold".to_string(),
            });
        }
        if let Some(w) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(AnalysisError::InvalidBinTable {
                message: format!("thresholds not strictly increasing: {} >= {}", w[0], w[1]),
            });
        }
        Ok(Self {
            thresholds: Cow::Owned(thresholds),
        })
    }

    /// Route a size to its bin.
    ///
    /// Returns the smallest bin whose threshold is `>= size`, or
    /// [`BinSlot::Overflow`] when the size exceeds every threshold.
    pub fn assign(&self, size: u64) -> BinSlot {
        // First index whose threshold is >= size.
        let idx = self.thresholds.partition_point(|&t| t < size);
        if idx < self.thresholds.len() {
            BinSlot::Bin(idx)
        } else {
            BinSlot::Overflow
        }
    }

    /// Number of regular bins (the overflow tier is not counted).
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Always false for a validated table; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Threshold of the bin at `index`.
    pub fn threshold(&self, index: usize) -> Option<u64> {
        self.thresholds.get(index).copied()
    }

    /// All thresholds in ascending order.
    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    /// The largest threshold; everything above it overflows.
    pub fn max_threshold(&self) -> u64 {
        self.thresholds[self.thresholds.len() - 1]
    }

    /// Compact label for a slot, e.g. `512B`, `4K`, `1M`, `>1G`.
    pub fn label(&self, slot: BinSlot) -> String {
        match slot {
            BinSlot::Bin(i) => format_threshold(self.thresholds[i]),
            BinSlot::Overflow => format!(">{}", format_threshold(self.max_threshold())),
        }
    }
}

impl Default for BinTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl Serialize for BinTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.thresholds.serialize(serializer)
    }
}

impl fmt::Display for BinTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.thresholds.iter().map(|&t| format_threshold(t)).collect();
        write!(f, "[{}]", labels.join(", "))
    }
}

/// Format a byte threshold with the largest binary unit that divides it evenly.
pub fn format_threshold(bytes: u64) -> String {
    const UNITS: [(u64, &str); 4] = [(1 << 40, "T"), (GIB, "G"), (MIB, "M"), (KIB, "K")];
    for (unit, suffix) in UNITS {
        if bytes >= unit && bytes % unit == 0 {
            return format!("{}{suffix}", bytes / unit);
        }
    }
    format!("{bytes}B")
}
