//! Per-card win and loss rates over a date range.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::params::parse_window;
use super::{AnalyticsEngine, QueryError};
use crate::calculate::extract::primary_card_ids;
use crate::calculate::{round2, CardEnrichment, TallyMap};
use crate::models::{Battle, CardId};
use crate::storage::{BattleFilter, TimeWindow};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStatsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Overrides the configured minimum battles per card
    pub min_sample: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStat {
    pub card_id: CardId,
    pub name: String,
    pub total_battles: u64,
    pub wins: u64,
    pub losses: u64,
    pub win_percentage: f64,
    pub loss_percentage: f64,
    #[serde(flatten)]
    pub metadata: CardEnrichment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStatsReport {
    pub time_range: TimeWindow,
    pub battles_analyzed: usize,
    pub cards: Vec<CardStat>,
}

impl AnalyticsEngine {
    /// Win and loss percentages for every card the primary player used.
    ///
    /// A card counts once per battle however many copies the deck lists.
    /// Ordered by win percentage, best first.
    pub async fn card_stats(&self, params: CardStatsParams) -> Result<CardStatsReport, QueryError> {
        let window = parse_window(params.start_date.as_deref(), params.end_date.as_deref())?;
        let min_sample = params
            .min_sample
            .unwrap_or(self.config.card_stats_min_sample);
        info!(
            start = %window.start_date,
            end = %window.end_date,
            min_sample,
            "Computing card stats"
        );

        let battles = self.battles.scan(&BattleFilter::new().within(window)).await?;

        let tallies = TallyMap::<CardId>::par_fold(&battles, |battle: &Battle, map| {
            for id in primary_card_ids(battle) {
                map.record(id, battle.has_won);
            }
        });
        debug!("{} distinct cards in {} battles", tallies.len(), battles.len());

        let battle_names = first_seen_names(&battles);
        let ranked = tallies.ranked(min_sample);
        let index = self.card_index(ranked.iter().map(|r| r.key).collect()).await?;

        let cards = ranked
            .into_iter()
            .map(|r| {
                let details = index.details(r.key, battle_names.get(&r.key).copied());
                CardStat {
                    card_id: r.key,
                    name: details.name,
                    total_battles: r.tally.total_battles(),
                    wins: r.tally.wins(),
                    losses: r.tally.losses(),
                    win_percentage: round2(r.win_percentage),
                    loss_percentage: round2(r.loss_percentage),
                    metadata: details.metadata,
                }
            })
            .collect();

        Ok(CardStatsReport {
            time_range: window,
            battles_analyzed: battles.len(),
            cards,
        })
    }
}

/// Name of each primary card as first seen in `battles`.
pub(crate) fn first_seen_names(battles: &[Battle]) -> HashMap<CardId, &str> {
    let mut names = HashMap::new();
    for card in battles.iter().flat_map(|b| b.cards.iter()) {
        names.entry(card.id).or_insert(card.name.as_str());
    }
    names
}
