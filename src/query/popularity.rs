//! Most and least used cards among top-ranked players.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AnalyticsEngine, QueryError};
use crate::calculate::{CardEnrichment, ExtractOptions, FrequencyTable, RankOrder};
use crate::models::CardId;
use crate::storage::BattleFilter;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularityParams {
    /// Overrides the configured top-rank threshold
    pub max_rank: Option<u32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularCard {
    pub card_id: CardId,
    pub name: String,
    pub count: u64,
    #[serde(flatten)]
    pub metadata: CardEnrichment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularityReport {
    pub max_rank: u32,
    pub battles_considered: usize,
    pub cards: Vec<PopularCard>,
}

impl AnalyticsEngine {
    /// Cards appearing most often in top-ranked battles.
    pub async fn popular_cards(&self, params: PopularityParams) -> Result<PopularityReport, QueryError> {
        self.card_popularity(params, RankOrder::MostUsed).await
    }

    /// Cards appearing least often in top-ranked battles.
    pub async fn least_popular_cards(
        &self,
        params: PopularityParams,
    ) -> Result<PopularityReport, QueryError> {
        self.card_popularity(params, RankOrder::LeastUsed).await
    }

    async fn card_popularity(
        &self,
        params: PopularityParams,
        order: RankOrder,
    ) -> Result<PopularityReport, QueryError> {
        let max_rank = params.max_rank.unwrap_or(self.config.top_rank_threshold);
        let limit = params.limit.unwrap_or(self.config.popularity_limit);
        if limit == 0 {
            return Err(QueryError::validation("limit must be greater than 0"));
        }
        info!(max_rank, limit, ?order, "Computing card popularity");

        let filter = BattleFilter::new().with_max_global_rank(max_rank);
        let battles = self.battles.scan(&filter).await?;

        // Stores may over-return; the filter is authoritative.
        let battles_considered = battles.iter().filter(|b| filter.matches(b)).count();
        let table = FrequencyTable::from_battles(
            &battles,
            |b| filter.matches(b),
            ExtractOptions::ALL_DECKS,
        );
        debug!(
            "{} distinct cards across {} battles",
            table.len(),
            battles_considered
        );

        let ranked = table.ranked(order, Some(limit));
        let index = self
            .card_index(ranked.iter().map(|c| c.card_id).collect())
            .await?;

        let cards = ranked
            .into_iter()
            .map(|freq| {
                let details = index.details(freq.card_id, Some(freq.name.as_str()));
                PopularCard {
                    card_id: freq.card_id,
                    name: details.name,
                    count: freq.count,
                    metadata: details.metadata,
                }
            })
            .collect();

        Ok(PopularityReport {
            max_rank,
            battles_considered,
            cards,
        })
    }
}
