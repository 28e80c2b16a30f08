//! Winning k-card combinations.
//!
//! Every battle whose primary deck holds at least k cards contributes its
//! k-subsets, capped per battle, to a tally keyed by combo. Combos are kept
//! when they reach both the win-rate threshold and the minimum sample.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::card_stats::first_seen_names;
use super::params::{parse_window, required};
use super::{check_percentage, AnalyticsEngine, QueryError};
use crate::calculate::combos::binomial;
use crate::calculate::extract::primary_card_ids;
use crate::calculate::{
    average_elixir, enumerate_combos, round2, CardDetails, TallyMap, MAX_COMBO_SIZE,
    MIN_COMBO_SIZE,
};
use crate::models::{Battle, CardId, ComboSignature};
use crate::storage::{BattleFilter, TimeWindow};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinningCombosParams {
    /// Cards per combo, 2 to 8
    pub combo_size: Option<usize>,
    /// Minimum win percentage, 0 to 100
    pub win_rate_threshold: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_sample: Option<u64>,
    pub limit: Option<usize>,
    /// Overrides the configured per-battle enumeration cap
    pub max_combos_per_battle: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboStat {
    pub combo: ComboSignature,
    pub total_battles: u64,
    pub wins: u64,
    pub win_percentage: f64,
    pub cards: Vec<CardDetails>,
    pub average_elixir_cost: Option<f64>,
}

/// The effective parameters, echoed back with the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboQuery {
    pub combo_size: usize,
    pub win_rate_threshold: f64,
    pub min_sample: u64,
    pub time_range: TimeWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinningCombosReport {
    pub query: ComboQuery,
    pub battles_analyzed: usize,
    /// Combos passing both filters, before the limit applies
    pub total_matching_combos: usize,
    pub combos: Vec<ComboStat>,
}

impl AnalyticsEngine {
    /// Rank k-card combos of the primary deck by win percentage.
    pub async fn winning_combos(
        &self,
        params: WinningCombosParams,
    ) -> Result<WinningCombosReport, QueryError> {
        let k = required(params.combo_size, "comboSize")?;
        if !(MIN_COMBO_SIZE..=MAX_COMBO_SIZE).contains(&k) {
            return Err(QueryError::validation(format!(
                "comboSize must be between {} and {}, got {}",
                MIN_COMBO_SIZE, MAX_COMBO_SIZE, k
            )));
        }
        let threshold = check_percentage(
            "winRateThreshold",
            params
                .win_rate_threshold
                .unwrap_or(self.config.combo_win_rate_threshold),
        )?;
        let window = parse_window(params.start_date.as_deref(), params.end_date.as_deref())?;
        let min_sample = params.min_sample.unwrap_or(self.config.min_sample);
        let limit = params.limit.unwrap_or(self.config.combo_limit);
        let cap = params
            .max_combos_per_battle
            .unwrap_or(self.config.max_combos_per_battle);
        if limit == 0 || cap == 0 {
            return Err(QueryError::validation(
                "limit and maxCombosPerBattle must be greater than 0",
            ));
        }
        info!(k, threshold, min_sample, cap, "Searching winning combos");

        let filter = BattleFilter::new()
            .within(window)
            .with_min_primary_cards(k);
        let battles = self.battles.scan(&filter).await?;

        let truncated = battles
            .iter()
            .filter(|b| binomial(primary_card_ids(b).len(), k) > cap as u64)
            .count();
        if truncated > 0 {
            warn!(
                "{} battles exceeded {} combos of size {} and were truncated",
                truncated, cap, k
            );
        }

        let tallies = TallyMap::<ComboSignature>::par_fold(&battles, |battle: &Battle, map| {
            for combo in enumerate_combos(&primary_card_ids(battle), k, cap) {
                map.record(combo, battle.has_won);
            }
        });
        debug!("{} distinct combos in {} battles", tallies.len(), battles.len());

        let mut ranked: Vec<_> = tallies
            .ranked(min_sample)
            .into_iter()
            .filter(|r| r.tally.meets(threshold, false))
            .collect();
        let total_matching_combos = ranked.len();
        info!("{} combos meet the criteria", total_matching_combos);
        ranked.truncate(limit);

        let ids: BTreeSet<CardId> = ranked
            .iter()
            .flat_map(|r| r.key.ids().iter().copied())
            .collect();
        let index = self.card_index(ids).await?;
        let battle_names = first_seen_names(&battles);

        let combos = ranked
            .into_iter()
            .map(|r| {
                let cards: Vec<CardDetails> = r
                    .key
                    .ids()
                    .iter()
                    .map(|id| index.details(*id, battle_names.get(id).copied()))
                    .collect();
                ComboStat {
                    total_battles: r.tally.total_battles(),
                    wins: r.tally.wins(),
                    win_percentage: round2(r.win_percentage),
                    average_elixir_cost: average_elixir(&cards),
                    cards,
                    combo: r.key,
                }
            })
            .collect();

        Ok(WinningCombosReport {
            query: ComboQuery {
                combo_size: k,
                win_rate_threshold: threshold,
                min_sample,
                time_range: window,
            },
            battles_analyzed: battles.len(),
            total_matching_combos,
            combos,
        })
    }
}
