//! Underdog victories: wins with a card against higher-trophy opponents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::params::required;
use super::{check_percentage, AnalyticsEngine, QueryError};
use crate::calculate::deficit_percentage;
use crate::models::{Battle, CardId};
use crate::storage::BattleFilter;

/// Towers in a match; crowns never exceed this.
const MAX_TOWERS: u32 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderdogParams {
    pub card_id: Option<CardId>,
    /// Minimum trophy deficit, as a percentage of the opponent's trophies
    pub trophy_percentage: Option<f64>,
    /// Crowns the opponents must have taken
    pub towers_destroyed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderdogCard {
    pub id: CardId,
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderdogCriteria {
    pub trophy_percentage: f64,
    pub towers_destroyed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderdogStatistics {
    pub total_battles: u64,
    pub battles_with_card: u64,
    pub winning_battles: u64,
    pub victory_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderdogReport {
    pub card: UnderdogCard,
    pub criteria: UnderdogCriteria,
    pub statistics: UnderdogStatistics,
}

impl AnalyticsEngine {
    /// Count wins with a card where the winner started with at least
    /// `trophy_percentage` fewer trophies than the strongest opponent and
    /// the opponents took exactly `towers_destroyed` crowns.
    pub async fn underdog_victories(&self, params: UnderdogParams) -> Result<UnderdogReport, QueryError> {
        let card_id = required(params.card_id, "cardId")?;
        let trophy_percentage =
            check_percentage("trophyPercentage", required(params.trophy_percentage, "trophyPercentage")?)?;
        let towers_destroyed = required(params.towers_destroyed, "towersDestroyed")?;
        if towers_destroyed > MAX_TOWERS {
            return Err(QueryError::validation(format!(
                "towersDestroyed must be between 0 and {}, got {}",
                MAX_TOWERS, towers_destroyed
            )));
        }
        info!(card_id, trophy_percentage, towers_destroyed, "Counting underdog victories");

        let card = self
            .cards
            .find_by_ids(&BTreeSet::from([card_id]))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::NotFound {
                kind: "card",
                identifiers: vec![card_id.to_string()],
            })?;

        let with_card = BattleFilter::new().using_card(card_id);
        let won_with_card = with_card.clone().with_outcome(true);

        let total_battles = self.battles.count(&BattleFilter::new()).await?;
        let battles_with_card = self.battles.count(&with_card).await?;
        let wins = self.battles.scan(&won_with_card).await?;

        let victory_count = wins
            .iter()
            .filter(|b| is_underdog_win(b, trophy_percentage, towers_destroyed))
            .count() as u64;
        debug!(
            "{} of {} wins with card {} were underdog wins",
            victory_count,
            wins.len(),
            card_id
        );

        Ok(UnderdogReport {
            card: UnderdogCard {
                id: card.id,
                icon_url: card.icon_url().map(str::to_string),
                name: card.name,
            },
            criteria: UnderdogCriteria {
                trophy_percentage,
                towers_destroyed,
            },
            statistics: UnderdogStatistics {
                total_battles,
                battles_with_card,
                winning_battles: wins.len() as u64,
                victory_count,
            },
        })
    }
}

/// Trophy counts must be known and positive on both sides.
fn is_underdog_win(battle: &Battle, min_deficit: f64, towers: u32) -> bool {
    let winner = battle.starting_trophies.unwrap_or(0);
    let strongest_opponent = battle.max_opponent_trophies();
    if winner == 0 || strongest_opponent == 0 {
        return false;
    }
    deficit_percentage(winner, strongest_opponent) >= min_deficit
        && battle.max_opponent_crowns() == towers
}
