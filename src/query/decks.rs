//! Best-performing decks per player.
//!
//! A deck is keyed by its normalized card set together with the player tag
//! of whoever brought it, so two players on the same list rank separately.
//! Every participant contributes: the primary player and teammates share
//! the recorded outcome, opponents get the inverse.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::params::parse_window;
use super::{check_percentage, AnalyticsEngine, QueryError};
use crate::calculate::{average_elixir, round2, CardDetails, TallyMap};
use crate::models::{Battle, CardId, DeckSignature};
use crate::storage::{BattleFilter, TimeWindow};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDecksParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Win percentage a deck must exceed, 0 to 100
    pub win_rate_threshold: Option<f64>,
    pub min_sample: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStat {
    pub player_tag: String,
    pub deck: DeckSignature,
    pub total_battles: u64,
    pub wins: u64,
    pub losses: u64,
    pub win_percentage: f64,
    pub cards: Vec<CardDetails>,
    pub average_elixir_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDecksReport {
    pub time_range: TimeWindow,
    pub win_rate_threshold: f64,
    pub min_sample: u64,
    /// Decks passing both filters, before the limit applies
    pub total_matching_decks: usize,
    pub decks: Vec<DeckStat>,
}

type DeckKey = (DeckSignature, String);

impl AnalyticsEngine {
    /// Decks whose win percentage exceeds the threshold over at least
    /// `min_sample` battles, best first.
    pub async fn top_decks(&self, params: TopDecksParams) -> Result<TopDecksReport, QueryError> {
        let window = parse_window(params.start_date.as_deref(), params.end_date.as_deref())?;
        let threshold = check_percentage(
            "winRateThreshold",
            params
                .win_rate_threshold
                .unwrap_or(self.config.deck_win_rate_threshold),
        )?;
        let min_sample = params.min_sample.unwrap_or(self.config.min_sample);
        let limit = params.limit.unwrap_or(self.config.deck_limit);
        if limit == 0 {
            return Err(QueryError::validation("limit must be greater than 0"));
        }
        info!(threshold, min_sample, limit, "Ranking decks");

        let battles = self.battles.scan(&BattleFilter::new().within(window)).await?;
        let tallies = TallyMap::<DeckKey>::par_fold(&battles, record_decks);
        debug!("{} distinct decks in {} battles", tallies.len(), battles.len());

        let mut ranked: Vec<_> = tallies
            .ranked(min_sample)
            .into_iter()
            .filter(|r| r.tally.meets(threshold, true))
            .collect();
        let total_matching_decks = ranked.len();
        ranked.truncate(limit);

        let ids: BTreeSet<CardId> = ranked
            .iter()
            .flat_map(|r| r.key.0.ids().iter().copied())
            .collect();
        let index = self.card_index(ids).await?;

        let decks = ranked
            .into_iter()
            .map(|r| {
                let (deck, player_tag) = r.key;
                let cards = index.details_for(deck.ids());
                DeckStat {
                    player_tag,
                    total_battles: r.tally.total_battles(),
                    wins: r.tally.wins(),
                    losses: r.tally.losses(),
                    win_percentage: round2(r.win_percentage),
                    average_elixir_cost: average_elixir(&cards),
                    cards,
                    deck,
                }
            })
            .collect();

        Ok(TopDecksReport {
            time_range: window,
            win_rate_threshold: threshold,
            min_sample,
            total_matching_decks,
            decks,
        })
    }
}

/// Record every participant's deck (cards plus support) with its own outcome.
fn record_decks(battle: &Battle, map: &mut TallyMap<DeckKey>) {
    for side in battle.sides() {
        let deck = DeckSignature::from_ids(side.all_cards().map(|c| c.id));
        if deck.is_empty() {
            continue;
        }
        map.record((deck, side.tag.to_string()), side.role.won(battle.has_won));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;
    use crate::query::fixtures::{at, battle, broken_engine, engine, refs};
    use pretty_assertions::assert_eq;

    fn params(threshold: f64, min_sample: u64) -> TopDecksParams {
        TopDecksParams {
            start_date: Some("2025-03-01T00:00:00Z".to_string()),
            end_date: Some("2025-03-31T00:00:00Z".to_string()),
            win_rate_threshold: Some(threshold),
            min_sample: Some(min_sample),
            limit: None,
        }
    }

    #[test]
    fn test_record_decks_credits_each_side() {
        let b = Battle::new(at(2, 9), "#ME", true)
            .with_cards(refs(&[2, 1]))
            .with_support_cards(refs(&[7]))
            .with_teammate(Participant::new("#MATE").with_cards(refs(&[3])))
            .with_opponent(Participant::new("#OPP").with_cards(refs(&[4, 4])));

        let mut map = TallyMap::new();
        record_decks(&b, &mut map);

        let mine = (DeckSignature::from_ids([1, 2, 7]), "#ME".to_string());
        let mate = (DeckSignature::from_ids([3]), "#MATE".to_string());
        let opp = (DeckSignature::from_ids([4]), "#OPP".to_string());
        assert_eq!(map.get(&mine).unwrap().wins(), 1);
        assert_eq!(map.get(&mate).unwrap().wins(), 1);
        assert_eq!(map.get(&opp).unwrap().losses(), 1);
        assert_eq!(map.len(), 3);
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let mut battles = Vec::new();
        // 3 of 5 with [1, 2]: exactly 60%
        for won in [true, true, true, false, false] {
            battles.push(battle(3, won, &[1, 2]));
        }
        // 4 of 5 with [3, 4]: 80%
        for won in [true, true, true, true, false] {
            battles.push(battle(4, won, &[4, 3]));
        }
        let engine = engine(battles);

        let report = engine.top_decks(params(60.0, 5)).await.unwrap();
        assert_eq!(report.total_matching_decks, 1);

        let deck = &report.decks[0];
        assert_eq!(deck.deck.ids(), &[3, 4]);
        assert_eq!(deck.player_tag, "#PLAYER");
        assert_eq!(deck.win_percentage, 80.0);
        assert_eq!(deck.wins, 4);
        assert_eq!(deck.losses, 1);
        assert_eq!(deck.average_elixir_cost, Some(4.5));
        let names: Vec<&str> = deck.cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Fireball", "Giant"]);
    }

    #[tokio::test]
    async fn test_rate_on_threshold_excluded() {
        // 7 of 25 is exactly 28%
        let battles = (0..25).map(|i| battle(6, i < 7, &[1, 2])).collect();
        let engine = engine(battles);

        let report = engine.top_decks(params(28.0, 5)).await.unwrap();
        assert_eq!(report.total_matching_decks, 0);
        assert!(report.decks.is_empty());

        let report = engine.top_decks(params(27.9, 5)).await.unwrap();
        assert_eq!(report.total_matching_decks, 1);
        assert_eq!(report.decks[0].win_percentage, 28.0);
    }

    #[tokio::test]
    async fn test_min_sample_and_unknown_cards() {
        let engine = engine(vec![
            battle(3, true, &[1, 99]),
            battle(4, true, &[1, 99]),
            battle(5, true, &[2]),
        ]);

        let report = engine.top_decks(params(0.0, 2)).await.unwrap();
        assert_eq!(report.decks.len(), 1);

        let deck = &report.decks[0];
        assert_eq!(deck.cards[1].name, "Unknown card");
        assert_eq!(deck.cards[1].metadata.elixir_cost, None);
        // Averaged over the resolved card only
        assert_eq!(deck.average_elixir_cost, Some(3.0));
    }

    #[tokio::test]
    async fn test_limit_keeps_total() {
        let engine = engine(vec![
            battle(3, true, &[1]),
            battle(3, true, &[2]),
            battle(3, true, &[3]),
        ]);

        let report = engine
            .top_decks(TopDecksParams {
                limit: Some(2),
                ..params(50.0, 1)
            })
            .await
            .unwrap();
        assert_eq!(report.total_matching_decks, 3);
        assert_eq!(report.decks.len(), 2);
        // Equal records: ascending key
        assert_eq!(report.decks[0].deck.ids(), &[1]);
        assert_eq!(report.decks[1].deck.ids(), &[2]);
    }

    #[tokio::test]
    async fn test_rejects_bad_threshold() {
        let err = engine(Vec::new())
            .top_decks(params(120.0, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let err = broken_engine().top_decks(params(60.0, 5)).await.unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
    }
}
