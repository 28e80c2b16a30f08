//! Read-only battle and card stores.
//!
//! The engine sees storage through two narrow traits:
//! - [`BattleStore`]: filtered scans, counts and store-side aggregates
//! - [`CardCatalog`]: static card metadata lookups
//!
//! Two implementations ship with the crate: JSONL files on disk
//! ([`jsonl`]) and an in-memory store ([`memory`]).

pub mod filter;
pub mod jsonl;
pub mod memory;

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{Battle, CardId, CardMetadata};

pub use filter::{BattleFilter, TimeWindow};
pub use jsonl::{JsonlBattleStore, JsonlCardCatalog, JsonlReader};
pub use memory::MemoryStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid path pattern: {0}")]
    InvalidPattern(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Glob matching every battle file (`battles.jsonl`, `battles-2025-03.jsonl`, ...).
    pub fn battles_pattern(&self) -> String {
        self.data_dir
            .join("battles*.jsonl")
            .to_string_lossy()
            .into_owned()
    }

    pub fn cards_path(&self) -> PathBuf {
        self.data_dir.join("cards.jsonl")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Store-side aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Battle counts grouped by `hasWon`.
    CountByOutcome,
    /// Oldest and newest battle time.
    TimeBounds,
}

/// One row of an aggregation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum AggregateRecord {
    Outcome {
        has_won: bool,
        count: u64,
    },
    TimeBounds {
        oldest: DateTime<Utc>,
        newest: DateTime<Utc>,
    },
}

/// Read access to recorded battles.
#[async_trait]
pub trait BattleStore: Send + Sync {
    /// All battles matching `filter`.
    async fn scan(&self, filter: &BattleFilter) -> Result<Vec<Battle>, StorageError>;

    /// Number of battles matching `filter`.
    async fn count(&self, filter: &BattleFilter) -> Result<u64, StorageError> {
        Ok(self.scan(filter).await?.len() as u64)
    }

    /// Pre-aggregate matching battles without returning them.
    async fn aggregate(
        &self,
        filter: &BattleFilter,
        aggregation: Aggregation,
    ) -> Result<Vec<AggregateRecord>, StorageError> {
        let battles = self.scan(filter).await?;
        Ok(aggregate_battles(&battles, aggregation))
    }
}

/// Read access to the static card catalog.
#[async_trait]
pub trait CardCatalog: Send + Sync {
    /// Every catalog entry.
    async fn all(&self) -> Result<Vec<CardMetadata>, StorageError>;

    /// Entries whose id is in `ids`. Unknown ids are simply absent.
    async fn find_by_ids(&self, ids: &BTreeSet<CardId>) -> Result<Vec<CardMetadata>, StorageError> {
        let cards = self.all().await?;
        Ok(cards.into_iter().filter(|c| ids.contains(&c.id)).collect())
    }

    /// Entries whose name is in `names` (exact match).
    async fn find_by_names(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<Vec<CardMetadata>, StorageError> {
        let cards = self.all().await?;
        Ok(cards
            .into_iter()
            .filter(|c| names.contains(&c.name))
            .collect())
    }
}

/// Compute an aggregation over already-loaded battles.
pub fn aggregate_battles(battles: &[Battle], aggregation: Aggregation) -> Vec<AggregateRecord> {
    match aggregation {
        Aggregation::CountByOutcome => {
            let wins = battles.iter().filter(|b| b.has_won).count() as u64;
            let losses = battles.len() as u64 - wins;
            [(true, wins), (false, losses)]
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(has_won, count)| AggregateRecord::Outcome { has_won, count })
                .collect()
        }
        Aggregation::TimeBounds => {
            let oldest = battles.iter().map(|b| b.battle_time).min();
            let newest = battles.iter().map(|b| b.battle_time).max();
            match (oldest, newest) {
                (Some(oldest), Some(newest)) => vec![AggregateRecord::TimeBounds { oldest, newest }],
                _ => Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.cards_path(), PathBuf::from("/data/cards.jsonl"));
        assert_eq!(config.battles_pattern(), "/data/battles*.jsonl");
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_aggregate_outcomes() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let battles = vec![
            Battle::new(t, "#A", true),
            Battle::new(t, "#B", true),
            Battle::new(t, "#C", false),
        ];

        let records = aggregate_battles(&battles, Aggregation::CountByOutcome);
        assert_eq!(
            records,
            vec![
                AggregateRecord::Outcome { has_won: true, count: 2 },
                AggregateRecord::Outcome { has_won: false, count: 1 },
            ]
        );
    }

    #[test]
    fn test_aggregate_time_bounds() {
        let early = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let battles = vec![Battle::new(late, "#A", true), Battle::new(early, "#B", false)];

        let records = aggregate_battles(&battles, Aggregation::TimeBounds);
        assert_eq!(
            records,
            vec![AggregateRecord::TimeBounds {
                oldest: early,
                newest: late
            }]
        );
        assert!(aggregate_battles(&[], Aggregation::TimeBounds).is_empty());
        assert!(aggregate_battles(&[], Aggregation::CountByOutcome).is_empty());
    }
}
