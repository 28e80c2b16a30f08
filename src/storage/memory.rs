//! In-memory store for tests and embedding callers.

use async_trait::async_trait;

use super::{BattleFilter, BattleStore, CardCatalog, StorageError};
use crate::models::{Battle, CardMetadata};

/// Battles and cards held in memory; serves both store traits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    battles: Vec<Battle>,
    cards: Vec<CardMetadata>,
}

impl MemoryStore {
    pub fn new(battles: Vec<Battle>, cards: Vec<CardMetadata>) -> Self {
        Self { battles, cards }
    }

    pub fn battles(&self) -> &[Battle] {
        &self.battles
    }
}

#[async_trait]
impl BattleStore for MemoryStore {
    async fn scan(&self, filter: &BattleFilter) -> Result<Vec<Battle>, StorageError> {
        Ok(self
            .battles
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &BattleFilter) -> Result<u64, StorageError> {
        Ok(self.battles.iter().filter(|b| filter.matches(b)).count() as u64)
    }
}

#[async_trait]
impl CardCatalog for MemoryStore {
    async fn all(&self) -> Result<Vec<CardMetadata>, StorageError> {
        Ok(self.cards.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_memory_store_filters() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let store = MemoryStore::new(
            vec![Battle::new(t, "#A", true), Battle::new(t, "#B", false)],
            vec![CardMetadata::new(1, "Knight")],
        );

        let losses = BattleFilter::new().with_outcome(false);
        let scanned = store.scan(&losses).await.unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].tag, "#B");
        assert_eq!(store.count(&BattleFilter::new()).await.unwrap(), 2);
        assert_eq!(store.all().await.unwrap().len(), 1);
        assert_eq!(store.battles().len(), 2);
    }
}
