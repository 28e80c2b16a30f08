//! Analytic queries over the battle and card stores.
//!
//! [`AnalyticsEngine`] is the single entry point. Each operation lives in
//! its own module next to its parameter and report types, and every one of
//! them follows the same shape: validate parameters, scan the store, fold
//! into counters, rank, then enrich with catalog metadata.

pub mod card_stats;
pub mod combo_loss;
pub mod decks;
pub mod overview;
pub mod params;
pub mod popularity;
pub mod underdog;
pub mod winning_combos;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::calculate::CardIndex;
use crate::config::EngineConfig;
use crate::models::CardId;
use crate::storage::{BattleStore, CardCatalog, StorageError};

pub use card_stats::{CardStat, CardStatsParams, CardStatsReport};
pub use combo_loss::{ComboLossParams, ComboLossReport};
pub use decks::{DeckStat, TopDecksParams, TopDecksReport};
pub use overview::{BattleOverview, BattleSummary, CardListing, PlayerSummary};
pub use params::{parse_combo_spec, parse_window};
pub use popularity::{PopularCard, PopularityParams, PopularityReport};
pub use underdog::{UnderdogParams, UnderdogReport};
pub use winning_combos::{ComboStat, WinningCombosParams, WinningCombosReport};

/// Query error types.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {}", .identifiers.join(", "))]
    NotFound {
        kind: &'static str,
        identifiers: Vec<String>,
    },

    #[error("Store error: {0}")]
    Store(#[from] StorageError),
}

impl QueryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Validation(_) => "VALIDATION",
            QueryError::NotFound { .. } => "NOT_FOUND",
            QueryError::Store(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Serializable body for reporting the error to a caller.
    pub fn to_response(&self) -> ErrorResponse {
        let not_found = match self {
            QueryError::NotFound { identifiers, .. } => identifiers.clone(),
            _ => Vec::new(),
        };
        ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                not_found,
            },
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_found: Vec<String>,
}

/// Query façade over a battle store and a card catalog.
#[derive(Clone)]
pub struct AnalyticsEngine {
    battles: Arc<dyn BattleStore>,
    cards: Arc<dyn CardCatalog>,
    config: EngineConfig,
}

impl AnalyticsEngine {
    pub fn new(
        battles: Arc<dyn BattleStore>,
        cards: Arc<dyn CardCatalog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            battles,
            cards,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Catalog entries for `ids`, indexed for enrichment.
    async fn card_index(&self, ids: BTreeSet<CardId>) -> Result<CardIndex, QueryError> {
        if ids.is_empty() {
            return Ok(CardIndex::default());
        }
        let cards = self.cards.find_by_ids(&ids).await?;
        Ok(CardIndex::new(cards))
    }
}

/// Check a percentage parameter.
pub(crate) fn check_percentage(name: &str, value: f64) -> Result<f64, QueryError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(QueryError::validation(format!(
            "{} must be between 0 and 100, got {}",
            name, value
        )))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let not_found = QueryError::NotFound {
            kind: "card",
            identifiers: vec!["Mega Knight".to_string()],
        };
        assert_eq!(not_found.code(), "NOT_FOUND");
        assert_eq!(not_found.to_string(), "card not found: Mega Knight");

        let body = serde_json::to_value(not_found.to_response()).unwrap();
        assert_eq!(body["error"]["notFound"][0], "Mega Knight");

        let validation = QueryError::validation("comboSize is required");
        assert_eq!(validation.code(), "VALIDATION");
        let body = serde_json::to_value(validation.to_response()).unwrap();
        assert!(body["error"].get("notFound").is_none());

        let store: QueryError = StorageError::Unavailable("down".to_string()).into();
        assert_eq!(store.code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_check_percentage() {
        assert_eq!(check_percentage("threshold", 0.0).unwrap(), 0.0);
        assert_eq!(check_percentage("threshold", 100.0).unwrap(), 100.0);
        assert!(check_percentage("threshold", -1.0).is_err());
        assert!(check_percentage("threshold", 100.5).is_err());
        assert!(check_percentage("threshold", f64::NAN).is_err());
    }
}
