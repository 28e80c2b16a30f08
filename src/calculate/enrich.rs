//! Joining statistics with card catalog metadata.
//!
//! The join is a left outer join on card id: statistics whose card is
//! missing from the catalog keep their place with null metadata.

use std::collections::HashMap;

use serde::Serialize;

use super::round2;
use crate::models::{CardId, CardMetadata, Rarity};

/// Name reported for a card that neither the catalog nor the battle names.
pub const UNKNOWN_CARD_NAME: &str = "Unknown card";

/// Catalog metadata attached to a single-card statistic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEnrichment {
    pub elixir_cost: Option<f64>,
    pub rarity: Option<Rarity>,
    pub icon_url: Option<String>,
}

/// A card inside a deck or combo, with whatever metadata resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub id: CardId,
    pub name: String,
    #[serde(flatten)]
    pub metadata: CardEnrichment,
}

/// Catalog entries indexed by id.
#[derive(Debug, Clone, Default)]
pub struct CardIndex {
    by_id: HashMap<CardId, CardMetadata>,
}

impl CardIndex {
    pub fn new(cards: impl IntoIterator<Item = CardMetadata>) -> Self {
        Self {
            by_id: cards.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: CardId) -> Option<&CardMetadata> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Metadata for `id`; every field is `None` when the id is unknown.
    pub fn enrichment(&self, id: CardId) -> CardEnrichment {
        match self.get(id) {
            Some(card) => CardEnrichment {
                elixir_cost: card.elixir_cost,
                rarity: card.rarity,
                icon_url: card.icon_url().map(str::to_string),
            },
            None => CardEnrichment::default(),
        }
    }

    /// Details for one card. The catalog name wins, then `fallback_name`.
    pub fn details(&self, id: CardId, fallback_name: Option<&str>) -> CardDetails {
        let name = self
            .get(id)
            .map(|c| c.name.as_str())
            .or(fallback_name.filter(|n| !n.is_empty()))
            .unwrap_or(UNKNOWN_CARD_NAME)
            .to_string();
        CardDetails {
            id,
            name,
            metadata: self.enrichment(id),
        }
    }

    /// Details for every id, in the given order.
    pub fn details_for(&self, ids: &[CardId]) -> Vec<CardDetails> {
        ids.iter().map(|&id| self.details(id, None)).collect()
    }
}

/// Mean elixir cost over the cards whose cost resolved, rounded to 2 places.
pub fn average_elixir(cards: &[CardDetails]) -> Option<f64> {
    let costs: Vec<f64> = cards.iter().filter_map(|c| c.metadata.elixir_cost).collect();
    if costs.is_empty() {
        return None;
    }
    Some(round2(costs.iter().sum::<f64>() / costs.len() as f64))
}
