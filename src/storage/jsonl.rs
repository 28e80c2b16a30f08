//! JSONL (JSON Lines) storage.
//!
//! Battles and cards are exported one JSON object per line. Battle exports
//! may be split across several `battles*.jsonl` files; all of them form the
//! store. Malformed lines are logged and skipped, never fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{BattleFilter, BattleStore, CardCatalog, StorageConfig, StorageError};
use crate::models::{Battle, CardMetadata};

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities from the file.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        self.read_where(|_| true)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(&line) {
                Ok(entity) if predicate(&entity) => entities.push(entity),
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to parse line {} in {:?}: {}", i + 1, self.path, e);
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

/// Battle store over `battles*.jsonl` files in the data directory.
#[derive(Debug, Clone)]
pub struct JsonlBattleStore {
    pattern: String,
}

impl JsonlBattleStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            pattern: config.battles_pattern(),
        }
    }

    /// Battle files currently on disk, in path order.
    pub fn battle_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries =
            glob::glob(&self.pattern).map_err(|e| StorageError::InvalidPattern(e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            files.push(entry.map_err(|e| StorageError::Io(e.into_error()))?);
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl BattleStore for JsonlBattleStore {
    async fn scan(&self, filter: &BattleFilter) -> Result<Vec<Battle>, StorageError> {
        let files = self.battle_files()?;
        let mut battles = Vec::new();
        for path in &files {
            let reader: JsonlReader<Battle> = JsonlReader::new(path.clone());
            battles.extend(reader.read_where(|b| filter.matches(b))?);
        }
        debug!(
            "Scanned {} battle files, {} battles matched",
            files.len(),
            battles.len()
        );
        Ok(battles)
    }
}

/// Card catalog backed by `cards.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonlCardCatalog {
    path: PathBuf,
}

impl JsonlCardCatalog {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.cards_path(),
        }
    }
}

#[async_trait]
impl CardCatalog for JsonlCardCatalog {
    async fn all(&self) -> Result<Vec<CardMetadata>, StorageError> {
        JsonlReader::new(self.path.clone()).read_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    const BATTLE_A: &str = r##"{"battleTime":"2025-05-01T10:00:00Z","tag":"#A","hasWon":true,"currentGlobalRank":12,"cards":[{"id":1,"name":"Knight"}]}"##;
    const BATTLE_B: &str = r##"{"battleTime":"2025-05-02T10:00:00Z","tag":"#B","hasWon":false,"cards":[{"id":2,"name":"Archers"}]}"##;

    fn write(dir: &TempDir, name: &str, lines: &[&str]) {
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    fn config(dir: &TempDir) -> StorageConfig {
        StorageConfig::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let dir = TempDir::new().unwrap();
        write(&dir, "battles.jsonl", &[BATTLE_A, "not-valid-json", "", BATTLE_B]);

        let reader: JsonlReader<Battle> = JsonlReader::new(dir.path().join("battles.jsonl"));
        let battles = reader.read_all().unwrap();

        assert!(reader.exists());
        assert_eq!(battles.len(), 2);
        assert_eq!(battles[0].tag, "#A");
        assert_eq!(battles[1].tag, "#B");
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let reader: JsonlReader<Battle> = JsonlReader::new(dir.path().join("nope.jsonl"));

        assert!(!reader.exists());
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_battle_store_reads_every_export() {
        let dir = TempDir::new().unwrap();
        write(&dir, "battles-2025-05a.jsonl", &[BATTLE_A]);
        write(&dir, "battles-2025-05b.jsonl", &[BATTLE_B]);
        write(&dir, "players.jsonl", &[r##"{"tag":"#A"}"##]);

        let store = JsonlBattleStore::new(&config(&dir));
        assert_eq!(store.battle_files().unwrap().len(), 2);

        let all = store.scan(&BattleFilter::new()).await.unwrap();
        assert_eq!(all.len(), 2);

        let top = BattleFilter::new().with_max_global_rank(100);
        assert_eq!(store.count(&top).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_battle_store_empty_dir() {
        let dir = TempDir::new().unwrap();
        let store = JsonlBattleStore::new(&config(&dir));
        assert!(store.scan(&BattleFilter::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_card_catalog_lookups() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "cards.jsonl",
            &[
                r#"{"id":1,"name":"Knight","elixirCost":3,"rarity":"common"}"#,
                r#"{"id":2,"name":"Archers","elixirCost":3,"rarity":"common"}"#,
            ],
        );
        let catalog = JsonlCardCatalog::new(&config(&dir));

        assert_eq!(catalog.all().await.unwrap().len(), 2);

        let by_id = catalog.find_by_ids(&BTreeSet::from([2, 99])).await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].name, "Archers");

        let names = BTreeSet::from(["Knight".to_string(), "Nope".to_string()]);
        let by_name = catalog.find_by_names(&names).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 1);
    }
}
