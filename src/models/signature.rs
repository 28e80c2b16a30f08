//! Normalized deck and combo keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::CardId;

/// The set of card ids a participant brought to one battle.
///
/// Ids are sorted ascending and deduplicated so the same deck always maps to
/// the same key regardless of slot order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckSignature(Vec<CardId>);

impl DeckSignature {
    /// Build a signature from card ids in any order.
    pub fn from_ids(ids: impl IntoIterator<Item = CardId>) -> Self {
        Self(normalize_ids(ids))
    }

    pub fn ids(&self) -> &[CardId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DeckSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.0)
    }
}

/// Exactly k distinct card ids, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComboSignature(Vec<CardId>);

impl ComboSignature {
    /// Build a combo key from ids in any order; duplicates collapse.
    pub fn from_ids(ids: impl IntoIterator<Item = CardId>) -> Self {
        Self(normalize_ids(ids))
    }

    /// Wrap ids the caller guarantees are already strictly ascending.
    pub(crate) fn from_sorted(ids: Vec<CardId>) -> Self {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        Self(ids)
    }

    pub fn ids(&self) -> &[CardId] {
        &self.0
    }

    /// Combo size (k).
    pub fn size(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ComboSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.0)
    }
}

/// Sort ascending and drop duplicates.
pub fn normalize_ids(ids: impl IntoIterator<Item = CardId>) -> Vec<CardId> {
    let mut ids: Vec<CardId> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn write_joined(f: &mut fmt::Formatter<'_>, ids: &[CardId]) -> fmt::Result {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            write!(f, "_")?;
        }
        write!(f, "{}", id)?;
    }
    Ok(())
}
