//! Win/loss tallies.

use serde::{Deserialize, Serialize};

/// Accumulated outcome counters for one key (card, deck or combo).
///
/// Counters only move through [`Tally::record`] and [`Tally::merge`], so
/// `wins + losses == total_battles` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    total_battles: u64,
    wins: u64,
    losses: u64,
}

impl Tally {
    /// Build a tally from raw counts, rejecting `wins > total`.
    pub fn from_counts(total_battles: u64, wins: u64) -> Option<Self> {
        (wins <= total_battles).then(|| Self {
            total_battles,
            wins,
            losses: total_battles - wins,
        })
    }

    /// Record one battle outcome.
    pub fn record(&mut self, won: bool) {
        self.total_battles += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    /// Add another tally's counters into this one.
    pub fn merge(&mut self, other: &Tally) {
        self.total_battles += other.total_battles;
        self.wins += other.wins;
        self.losses += other.losses;
    }

    pub fn total_battles(&self) -> u64 {
        self.total_battles
    }

    pub fn wins(&self) -> u64 {
        self.wins
    }

    pub fn losses(&self) -> u64 {
        self.losses
    }

    /// Win percentage in `[0, 100]`; 0 for an empty tally.
    pub fn win_percentage(&self) -> f64 {
        if self.total_battles == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_battles as f64 * 100.0
        }
    }

    /// Complement of [`Tally::win_percentage`].
    pub fn loss_percentage(&self) -> f64 {
        100.0 - self.win_percentage()
    }
}
