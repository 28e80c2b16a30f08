//! Card extraction from nested battle records.

use std::collections::BTreeSet;

use crate::models::{normalize_ids, Battle, CardId, CardRef, Role};

/// Which parts of a battle contribute cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub include_support: bool,
    pub include_team: bool,
    pub include_opponents: bool,
}

impl ExtractOptions {
    /// Every deck on both sides, support cards excluded.
    pub const ALL_DECKS: Self = Self {
        include_support: false,
        include_team: true,
        include_opponents: true,
    };

    /// The primary player and teammates, support cards included.
    pub const FRIENDLY_WITH_SUPPORT: Self = Self {
        include_support: true,
        include_team: true,
        include_opponents: false,
    };

    /// The primary player's deck only.
    pub const PRIMARY_DECK: Self = Self {
        include_support: false,
        include_team: false,
        include_opponents: false,
    };

    fn includes(&self, role: Role) -> bool {
        match role {
            Role::Primary => true,
            Role::Teammate => self.include_team,
            Role::Opponent => self.include_opponents,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::ALL_DECKS
    }
}

/// Flatten the selected card lists of a battle.
///
/// The result is a multiset: a card played by both sides appears twice.
pub fn extract_cards(battle: &Battle, options: ExtractOptions) -> impl Iterator<Item = &CardRef> {
    battle
        .sides()
        .filter(move |side| options.includes(side.role))
        .flat_map(move |side| {
            let support: &[CardRef] = if options.include_support {
                side.support_cards
            } else {
                &[]
            };
            side.cards.iter().chain(support.iter())
        })
}

/// Distinct card names present in the selected card lists.
pub fn card_names(battle: &Battle, options: ExtractOptions) -> BTreeSet<&str> {
    extract_cards(battle, options)
        .map(|c| c.name.as_str())
        .collect()
}

/// Ascending, deduplicated ids of the primary player's deck.
pub fn primary_card_ids(battle: &Battle) -> Vec<CardId> {
    normalize_ids(battle.cards.iter().map(|c| c.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;
    use chrono::{TimeZone, Utc};

    fn cards(ids: &[CardId]) -> Vec<CardRef> {
        ids.iter().map(|&id| CardRef::new(id, format!("card-{id}"))).collect()
    }

    fn sample_battle() -> Battle {
        Battle::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), "#P", true)
            .with_cards(cards(&[1, 2]))
            .with_support_cards(cards(&[90]))
            .with_teammate(
                Participant::new("#T")
                    .with_cards(cards(&[2, 3]))
                    .with_support_cards(cards(&[91])),
            )
            .with_opponent(Participant::new("#O").with_cards(cards(&[1, 4])))
    }

    fn ids(battle: &Battle, options: ExtractOptions) -> Vec<CardId> {
        let mut ids: Vec<CardId> = extract_cards(battle, options).map(|c| c.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_all_decks_keeps_duplicates() {
        assert_eq!(ids(&sample_battle(), ExtractOptions::ALL_DECKS), vec![1, 1, 2, 2, 3, 4]);
    }

    #[test]
    fn test_friendly_with_support() {
        assert_eq!(
            ids(&sample_battle(), ExtractOptions::FRIENDLY_WITH_SUPPORT),
            vec![1, 2, 2, 3, 90, 91]
        );
    }

    #[test]
    fn test_primary_deck_only() {
        assert_eq!(ids(&sample_battle(), ExtractOptions::PRIMARY_DECK), vec![1, 2]);
    }

    #[test]
    fn test_absent_lists_yield_nothing() {
        let battle: Battle =
            serde_json::from_str(r#"{"battleTime": "2025-01-01T00:00:00Z", "opponents": null}"#)
                .unwrap();
        assert_eq!(extract_cards(&battle, ExtractOptions::ALL_DECKS).count(), 0);
    }

    #[test]
    fn test_card_names_deduplicates() {
        let battle = sample_battle();
        let names = card_names(&battle, ExtractOptions::ALL_DECKS);
        assert_eq!(names.len(), 4);
        assert!(names.contains("card-4"));
    }

    #[test]
    fn test_primary_card_ids_sorted_unique() {
        let battle = Battle::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), "#P", true)
            .with_cards(cards(&[3, 1, 3, 2]));
        assert_eq!(primary_card_ids(&battle), vec![1, 2, 3]);
    }
}
