//! The recordsize ladder and the mapping from sizes to it.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::bins::{BinSlot, BinTable};

/// A recommended dataset block size.
///
/// Variants are declared in ascending order, so the derived `Ord` matches
/// the numeric order of [`Recordsize::bytes`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum Recordsize {
    #[strum(to_string = "4k", serialize = "4K")]
    #[serde(rename = "4k")]
    K4,
    #[strum(to_string = "8k", serialize = "8K")]
    #[serde(rename = "8k")]
    K8,
    #[strum(to_string = "16k", serialize = "16K")]
    #[serde(rename = "16k")]
    K16,
    #[strum(to_string = "32k", serialize = "32K")]
    #[serde(rename = "32k")]
    K32,
    #[strum(to_string = "64k", serialize = "64K")]
    #[serde(rename = "64k")]
    K64,
    #[strum(to_string = "128k", serialize = "128K")]
    #[serde(rename = "128k")]
    K128,
    #[strum(to_string = "256k", serialize = "256K")]
    #[serde(rename = "256k")]
    K256,
    #[strum(to_string = "512k", serialize = "512K")]
    #[serde(rename = "512k")]
    K512,
    #[strum(to_string = "1M", serialize = "1m")]
    #[serde(rename = "1M")]
    M1,
}

impl Recordsize {
    /// Largest value on the ladder.
    pub const MAX: Self = Self::M1;

    /// Size in bytes.
    pub fn bytes(self) -> u64 {
        match self {
            Self::K4 => 4 << 10,
            Self::K8 => 8 << 10,
            Self::K16 => 16 << 10,
            Self::K32 => 32 << 10,
            Self::K64 => 64 << 10,
            Self::K128 => 128 << 10,
            Self::K256 => 256 << 10,
            Self::K512 => 512 << 10,
            Self::M1 => 1 << 20,
        }
    }

    /// Smallest ladder value `>= bytes`, capped at `1M`.
    pub fn from_bytes(bytes: u64) -> Self {
        Self::iter()
            .find(|rs| rs.bytes() >= bytes)
            .unwrap_or(Self::MAX)
    }

    /// Map a bin slot through its threshold; the overflow tier maps to `1M`.
    pub fn from_slot(bins: &BinTable, slot: BinSlot) -> Self {
        match slot.index().and_then(|i| bins.threshold(i)) {
            Some(threshold) => Self::from_bytes(threshold),
            None => Self::MAX,
        }
    }
}
