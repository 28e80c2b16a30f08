//! Dataset overview, recent battles and the card list.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::{AnalyticsEngine, QueryError};
use crate::models::{Battle, CardId};
use crate::storage::{AggregateRecord, Aggregation, BattleFilter};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSpan {
    pub oldest: DateTime<Utc>,
    pub newest: DateTime<Utc>,
    pub days_span: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleOverview {
    pub total_battles: u64,
    pub wins: u64,
    pub losses: u64,
    /// Absent when the store holds no battles
    pub date_range: Option<DateSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub tag: String,
    pub global_rank: Option<u32>,
    pub crowns: Option<u32>,
    pub has_won: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSummary {
    pub battle_time: DateTime<Utc>,
    pub player1: PlayerSummary,
    pub player2: Option<PlayerSummary>,
}

impl BattleSummary {
    fn from_battle(battle: &Battle) -> Self {
        let player2 = battle.opponents.first().map(|o| PlayerSummary {
            tag: o.tag.clone(),
            global_rank: o.current_global_rank,
            crowns: o.crowns,
            has_won: !battle.has_won,
        });
        Self {
            battle_time: battle.battle_time,
            player1: PlayerSummary {
                tag: battle.tag.clone(),
                global_rank: battle.current_global_rank,
                crowns: battle.crowns,
                has_won: battle.has_won,
            },
            player2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardListing {
    pub id: CardId,
    pub name: String,
}

impl AnalyticsEngine {
    /// Battle count, outcome split and covered period.
    pub async fn battle_overview(&self) -> Result<BattleOverview, QueryError> {
        let all = BattleFilter::new();
        let total_battles = self.battles.count(&all).await?;

        let mut wins = 0;
        let mut losses = 0;
        let mut date_range = None;
        for record in self.battles.aggregate(&all, Aggregation::CountByOutcome).await? {
            if let AggregateRecord::Outcome { has_won, count } = record {
                if has_won {
                    wins += count;
                } else {
                    losses += count;
                }
            }
        }
        for record in self.battles.aggregate(&all, Aggregation::TimeBounds).await? {
            if let AggregateRecord::TimeBounds { oldest, newest } = record {
                date_range = Some(DateSpan {
                    oldest,
                    newest,
                    days_span: (newest - oldest).num_days(),
                });
            }
        }

        info!(total_battles, wins, losses, "Battle overview");
        Ok(BattleOverview {
            total_battles,
            wins,
            losses,
            date_range,
        })
    }

    /// Most recent battles, newest first.
    pub async fn recent_battles(&self, limit: Option<usize>) -> Result<Vec<BattleSummary>, QueryError> {
        let limit = limit.unwrap_or(self.config.recent_battles_limit);
        if limit == 0 {
            return Err(QueryError::validation("limit must be greater than 0"));
        }

        let mut battles = self.battles.scan(&BattleFilter::new()).await?;
        battles.sort_by(|a, b| b.battle_time.cmp(&a.battle_time));
        Ok(battles
            .iter()
            .take(limit)
            .map(BattleSummary::from_battle)
            .collect())
    }

    /// Every catalog card, sorted by name.
    pub async fn card_list(&self) -> Result<Vec<CardListing>, QueryError> {
        let mut cards: Vec<CardListing> = self
            .cards
            .all()
            .await?
            .into_iter()
            .map(|c| CardListing {
                id: c.id,
                name: c.name,
            })
            .collect();
        cards.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;
    use crate::query::fixtures::{at, battle, broken_engine, engine};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_overview() {
        let engine = engine(vec![
            battle(1, true, &[1]),
            battle(11, false, &[1]),
            battle(4, true, &[1]),
        ]);

        let overview = engine.battle_overview().await.unwrap();
        assert_eq!(overview.total_battles, 3);
        assert_eq!(overview.wins, 2);
        assert_eq!(overview.losses, 1);

        let span = overview.date_range.unwrap();
        assert_eq!(span.oldest, at(1, 12));
        assert_eq!(span.newest, at(11, 12));
        assert_eq!(span.days_span, 10);
    }

    #[tokio::test]
    async fn test_overview_of_empty_store() {
        let overview = engine(Vec::new()).battle_overview().await.unwrap();
        assert_eq!(overview.total_battles, 0);
        assert_eq!(overview.date_range, None);
    }

    #[tokio::test]
    async fn test_recent_battles_newest_first() {
        let engine = engine(vec![
            battle(1, true, &[1]),
            battle(3, false, &[1]).with_global_rank(7).with_crowns(1).with_opponent(
                Participant::new("#OPP").with_crowns(3),
            ),
            battle(2, true, &[1]),
        ]);

        let recent = engine.recent_battles(Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].battle_time, at(3, 12));
        assert_eq!(recent[1].battle_time, at(2, 12));

        assert_eq!(
            recent[0].player1,
            PlayerSummary {
                tag: "#PLAYER".to_string(),
                global_rank: Some(7),
                crowns: Some(1),
                has_won: false,
            }
        );
        let opponent = recent[0].player2.as_ref().unwrap();
        assert_eq!(opponent.tag, "#OPP");
        assert!(opponent.has_won);
        assert!(recent[1].player2.is_none());
    }

    #[tokio::test]
    async fn test_card_list_sorted_by_name() {
        let names: Vec<String> = engine(Vec::new())
            .card_list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Archers", "Fireball", "Giant", "Knight"]);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let err = broken_engine().battle_overview().await.unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
    }
}
