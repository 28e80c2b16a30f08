//! Statistics calculation engine.
//!
//! Computes derived metrics from stored battles:
//! - Card extraction from nested battle records
//! - Card usage frequency
//! - k-card combo enumeration
//! - Win/loss tallies and win-rate ranking
//! - Catalog enrichment

pub mod combos;
pub mod enrich;
pub mod extract;
pub mod frequency;
pub mod tally;

pub use combos::{combos_from_cards, enumerate_combos, MAX_COMBO_SIZE, MIN_COMBO_SIZE};
pub use enrich::{average_elixir, CardDetails, CardEnrichment, CardIndex};
pub use extract::{extract_cards, ExtractOptions};
pub use frequency::{CardFrequency, FrequencyTable, RankOrder};
pub use tally::{RankedTally, TallyMap};

/// Round to two decimal places for reporting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of `part` in `whole` as a percentage; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Percentage by which `higher` exceeds `lower`, relative to `higher`.
///
/// Used for trophy deficits: a 6000-trophy player beating a 7500-trophy
/// opponent had a 20% deficit. Returns 0 when `higher` is 0.
pub fn deficit_percentage(lower: u32, higher: u32) -> f64 {
    if higher == 0 {
        0.0
    } else {
        (higher as f64 - lower as f64) / higher as f64 * 100.0
    }
}
