//! Battle selection criteria.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{normalize_ids, Battle, CardId};

/// Inclusive time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }
}

/// Conjunction of optional battle predicates. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BattleFilter {
    pub window: Option<TimeWindow>,

    /// Keep battles whose primary player's global rank is at most this
    pub max_global_rank: Option<u32>,

    pub has_won: Option<bool>,

    /// Keep battles where the primary player or a teammate used the card
    pub uses_card: Option<CardId>,

    /// Keep battles whose primary deck has at least this many distinct cards
    pub min_primary_cards: Option<usize>,
}

impl BattleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn within(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_max_global_rank(mut self, rank: u32) -> Self {
        self.max_global_rank = Some(rank);
        self
    }

    pub fn with_outcome(mut self, has_won: bool) -> Self {
        self.has_won = Some(has_won);
        self
    }

    pub fn using_card(mut self, card_id: CardId) -> Self {
        self.uses_card = Some(card_id);
        self
    }

    pub fn with_min_primary_cards(mut self, count: usize) -> Self {
        self.min_primary_cards = Some(count);
        self
    }

    pub fn matches(&self, battle: &Battle) -> bool {
        if let Some(window) = &self.window {
            if !window.contains(battle.battle_time) {
                return false;
            }
        }

        if let Some(max_rank) = self.max_global_rank {
            match battle.current_global_rank {
                Some(rank) if rank <= max_rank => {}
                _ => return false,
            }
        }

        if let Some(has_won) = self.has_won {
            if battle.has_won != has_won {
                return false;
            }
        }

        if let Some(card_id) = self.uses_card {
            if !battle.primary_uses(card_id) && !battle.team_uses(card_id) {
                return false;
            }
        }

        if let Some(min) = self.min_primary_cards {
            if normalize_ids(battle.cards.iter().map(|c| c.id)).len() < min {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardRef, Participant};
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_matches_all() {
        assert!(BattleFilter::new().matches(&Battle::new(at(1), "#P", false)));
    }

    #[test]
    fn test_window_is_inclusive() {
        let filter = BattleFilter::new().within(TimeWindow::new(at(2), at(4)));

        assert!(!filter.matches(&Battle::new(at(1), "#P", true)));
        assert!(filter.matches(&Battle::new(at(2), "#P", true)));
        assert!(filter.matches(&Battle::new(at(4), "#P", true)));
        assert!(!filter.matches(&Battle::new(at(5), "#P", true)));
    }

    #[test]
    fn test_rank_filter_requires_rank() {
        let filter = BattleFilter::new().with_max_global_rank(100);

        assert!(filter.matches(&Battle::new(at(1), "#P", true).with_global_rank(100)));
        assert!(!filter.matches(&Battle::new(at(1), "#P", true).with_global_rank(101)));
        assert!(!filter.matches(&Battle::new(at(1), "#P", true)));
    }

    #[test]
    fn test_card_and_outcome() {
        let filter = BattleFilter::new().with_outcome(true).using_card(42);
        let via_team = Battle::new(at(1), "#P", true)
            .with_teammate(Participant::new("#T").with_cards(vec![CardRef::new(42, "X")]));
        let opponent_only = Battle::new(at(1), "#P", true)
            .with_opponent(Participant::new("#O").with_cards(vec![CardRef::new(42, "X")]));

        assert!(filter.matches(&via_team));
        assert!(!filter.matches(&opponent_only));

        let mut lost = via_team.clone();
        lost.has_won = false;
        assert!(!filter.matches(&lost));
    }

    #[test]
    fn test_min_primary_cards() {
        let filter = BattleFilter::new().with_min_primary_cards(2);
        let one = Battle::new(at(1), "#P", true).with_cards(vec![CardRef::new(1, "A")]);
        let two = one.clone().with_cards(vec![CardRef::new(1, "A"), CardRef::new(2, "B")]);

        assert!(!filter.matches(&one));
        assert!(filter.matches(&two));

        let repeated = one.with_cards(vec![CardRef::new(1, "A"), CardRef::new(1, "A")]);
        assert!(!filter.matches(&repeated));
    }
}
