//! Win-rate accumulation and ranking.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use rayon::prelude::*;
use serde::Serialize;

use crate::models::Tally;

/// Below this many items a fold runs on the calling thread.
const PARALLEL_CUTOFF: usize = 256;

/// Outcome counters keyed by card, deck or combo.
#[derive(Debug, Clone)]
pub struct TallyMap<K> {
    tallies: HashMap<K, Tally>,
}

impl<K> Default for TallyMap<K> {
    fn default() -> Self {
        Self {
            tallies: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> TallyMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `(key, won)` pairs.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = (K, bool)>) -> Self {
        let mut map = Self::new();
        for (key, won) in outcomes {
            map.record(key, won);
        }
        map
    }

    /// Record one outcome for `key`.
    pub fn record(&mut self, key: K, won: bool) {
        self.tallies.entry(key).or_default().record(won);
    }

    /// Sum another map into this one. Order of merging never changes the result.
    pub fn merge(mut self, other: Self) -> Self {
        let (mut into, from) = if self.tallies.len() >= other.tallies.len() {
            (std::mem::take(&mut self.tallies), other.tallies)
        } else {
            (other.tallies, std::mem::take(&mut self.tallies))
        };
        for (key, tally) in from {
            into.entry(key).or_default().merge(&tally);
        }
        Self { tallies: into }
    }

    pub fn get(&self, key: &K) -> Option<&Tally> {
        self.tallies.get(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}

impl<K: Eq + Hash + Send> TallyMap<K> {
    /// Fold `items` in parallel partitions and merge the partial maps.
    ///
    /// `visit` receives each item and the partition's map to record into.
    pub fn par_fold<T, F>(items: &[T], visit: F) -> Self
    where
        T: Sync,
        F: Fn(&T, &mut Self) + Sync + Send,
    {
        if items.len() < PARALLEL_CUTOFF {
            let mut map = Self::new();
            for item in items {
                visit(item, &mut map);
            }
            return map;
        }

        items
            .par_iter()
            .fold(Self::new, |mut map, item| {
                visit(item, &mut map);
                map
            })
            .reduce(Self::new, Self::merge)
    }
}

/// A tally with its derived percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTally<K> {
    pub key: K,
    #[serde(flatten)]
    pub tally: Tally,
    pub win_percentage: f64,
    pub loss_percentage: f64,
}

impl<K> RankedTally<K> {
    fn new(key: K, tally: Tally) -> Self {
        Self {
            key,
            win_percentage: tally.win_percentage(),
            loss_percentage: tally.loss_percentage(),
            tally,
        }
    }
}

impl<K: Eq + Hash + Ord> TallyMap<K> {
    /// Drop keys below `min_sample` battles and sort the rest.
    ///
    /// Order: win percentage descending, then total battles descending,
    /// then key ascending.
    pub fn ranked(self, min_sample: u64) -> Vec<RankedTally<K>> {
        let mut ranked: Vec<RankedTally<K>> = self
            .tallies
            .into_iter()
            .filter(|(_, t)| t.total_battles() >= min_sample)
            .map(|(key, tally)| RankedTally::new(key, tally))
            .collect();
        ranked.sort_by(|a, b| compare_ranked(&a.key, &a.tally, &b.key, &b.tally));
        ranked
    }
}

/// Ranking comparator; win rates are compared exactly as fractions.
pub fn compare_ranked<K: Ord>(key_a: &K, a: &Tally, key_b: &K, b: &Tally) -> Ordering {
    let lhs = a.wins() as u128 * b.total_battles() as u128;
    let rhs = b.wins() as u128 * a.total_battles() as u128;
    // Empty tallies rank as 0%.
    let by_rate = match (a.total_battles(), b.total_battles()) {
        (0, 0) => Ordering::Equal,
        (0, _) => 0u128.cmp(&(b.wins() as u128)),
        (_, 0) => (a.wins() as u128).cmp(&0),
        _ => lhs.cmp(&rhs),
    };
    by_rate
        .reverse()
        .then_with(|| b.total_battles().cmp(&a.total_battles()))
        .then_with(|| key_a.cmp(key_b))
}

impl Tally {
    /// Whether the win rate reaches `threshold_pct`, or exceeds it when `strict`.
    ///
    /// Compares `wins * 100` against `threshold * total` so a rate sitting
    /// exactly on the threshold is never lost to rounding.
    pub fn meets(&self, threshold_pct: f64, strict: bool) -> bool {
        let scaled_wins = self.wins() as f64 * 100.0;
        let required = threshold_pct * self.total_battles() as f64;
        if strict {
            scaled_wins > required
        } else {
            scaled_wins >= required
        }
    }
}
