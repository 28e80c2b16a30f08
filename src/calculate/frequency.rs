//! Card usage frequency counting.

use std::collections::HashMap;

use serde::Serialize;

use super::extract::{extract_cards, ExtractOptions};
use crate::models::{Battle, CardId, CardRef};

/// Direction of a popularity ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankOrder {
    #[default]
    MostUsed,
    LeastUsed,
}

/// Usage count for one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFrequency {
    pub card_id: CardId,
    /// Name as first seen in the battles
    pub name: String,
    pub count: u64,
}

/// Occurrence counts keyed by card id, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    entries: Vec<CardFrequency>,
    index: HashMap<CardId, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the cards of every battle accepted by `predicate`.
    pub fn from_battles<'a, I, P>(battles: I, predicate: P, options: ExtractOptions) -> Self
    where
        I: IntoIterator<Item = &'a Battle>,
        P: Fn(&Battle) -> bool,
    {
        let mut table = Self::new();
        for battle in battles.into_iter().filter(|b| predicate(b)) {
            for card in extract_cards(battle, options) {
                table.add(card);
            }
        }
        table
    }

    /// Count one occurrence.
    pub fn add(&mut self, card: &CardRef) {
        match self.index.get(&card.id) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(card.id, self.entries.len());
                self.entries.push(CardFrequency {
                    card_id: card.id,
                    name: card.name.clone(),
                    count: 1,
                });
            }
        }
    }

    pub fn count_of(&self, card_id: CardId) -> u64 {
        self.index
            .get(&card_id)
            .map(|&i| self.entries[i].count)
            .unwrap_or(0)
    }

    /// Number of distinct cards seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank by count; equal counts keep first-seen order.
    pub fn ranked(self, order: RankOrder, limit: Option<usize>) -> Vec<CardFrequency> {
        let mut entries = self.entries;
        match order {
            RankOrder::MostUsed => entries.sort_by(|a, b| b.count.cmp(&a.count)),
            RankOrder::LeastUsed => entries.sort_by(|a, b| a.count.cmp(&b.count)),
        }
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }
}
