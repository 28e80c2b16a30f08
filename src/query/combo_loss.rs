//! Losses suffered while fielding a given pair of cards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::params::{parse_combo_spec, parse_window, required};
use super::{AnalyticsEngine, QueryError};
use crate::calculate::extract::{card_names, ExtractOptions};
use crate::calculate::{CardDetails, CardIndex};
use crate::storage::{BattleFilter, TimeWindow};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboLossParams {
    /// Two card names, as `"A,B"` or `["A","B"]`
    pub combo: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboLossReport {
    /// The resolved pair, in request order
    pub combo: Vec<CardDetails>,
    pub loss_count: u64,
    pub time_range: TimeWindow,
}

impl AnalyticsEngine {
    /// Count lost battles where the primary player's side fielded both cards.
    ///
    /// The side covers the primary player and teammates, support cards
    /// included. Both names must exist in the catalog.
    pub async fn combo_losses(&self, params: ComboLossParams) -> Result<ComboLossReport, QueryError> {
        let combo = required(params.combo.as_deref(), "combo")?;
        let window = parse_window(params.start_date.as_deref(), params.end_date.as_deref())?;
        let names = parse_combo_spec(combo)?;
        info!(combo = ?names, "Counting combo losses");

        let requested: BTreeSet<String> = names.iter().cloned().collect();
        let found = self.cards.find_by_names(&requested).await?;
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !found.iter().any(|c| &c.name == *n))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(QueryError::NotFound {
                kind: "card",
                identifiers: missing,
            });
        }

        let combo: Vec<CardDetails> = {
            let index = CardIndex::new(found.iter().cloned());
            names
                .iter()
                .filter_map(|n| found.iter().find(|c| &c.name == n))
                .map(|c| index.details(c.id, None))
                .collect()
        };

        let filter = BattleFilter::new().within(window).with_outcome(false);
        let battles = self.battles.scan(&filter).await?;
        let loss_count = battles
            .iter()
            .filter(|b| {
                let present = card_names(b, ExtractOptions::FRIENDLY_WITH_SUPPORT);
                names.iter().all(|n| present.contains(n.as_str()))
            })
            .count() as u64;

        Ok(ComboLossReport {
            combo,
            loss_count,
            time_range: window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;
    use crate::query::fixtures::{battle, broken_engine, engine, refs};
    use pretty_assertions::assert_eq;

    fn params(combo: &str) -> ComboLossParams {
        ComboLossParams {
            combo: Some(combo.to_string()),
            start_date: Some("2025-03-01T00:00:00Z".to_string()),
            end_date: Some("2025-03-31T00:00:00Z".to_string()),
        }
    }

    #[tokio::test]
    async fn test_counts_friendly_side_losses() {
        let engine = engine(vec![
            // Both in the primary deck
            battle(2, false, &[1, 3]),
            // Split between primary support and a teammate
            battle(3, false, &[5])
                .with_support_cards(refs(&[1]))
                .with_teammate(Participant::new("#MATE").with_cards(refs(&[3]))),
            // Opponent cards never count
            battle(4, false, &[1]).with_opponent(Participant::new("#OPP").with_cards(refs(&[3]))),
            // A win
            battle(5, true, &[1, 3]),
        ]);

        let report = engine.combo_losses(params("Knight,Fireball")).await.unwrap();
        assert_eq!(report.loss_count, 2);

        let names: Vec<&str> = report.combo.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Knight", "Fireball"]);
        assert_eq!(report.combo[1].metadata.elixir_cost, Some(4.0));
    }

    #[tokio::test]
    async fn test_json_combo_form() {
        let engine = engine(vec![battle(2, false, &[1, 2])]);
        let report = engine
            .combo_losses(params(r#"["Archers","Knight"]"#))
            .await
            .unwrap();
        assert_eq!(report.loss_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_name_not_found() {
        let engine = engine(vec![battle(2, false, &[1, 2])]);
        let err = engine
            .combo_losses(params("Knight,Mega Knight"))
            .await
            .unwrap_err();

        match err {
            QueryError::NotFound { kind, identifiers } => {
                assert_eq!(kind, "card");
                assert_eq!(identifiers, vec!["Mega Knight".to_string()]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_arity_rejected() {
        let err = engine(Vec::new())
            .combo_losses(params("Knight"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));

        let err = engine(Vec::new())
            .combo_losses(ComboLossParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_no_losses_is_zero() {
        let engine = engine(vec![battle(2, true, &[1, 2])]);
        let report = engine.combo_losses(params("Knight,Archers")).await.unwrap();
        assert_eq!(report.loss_count, 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let err = broken_engine()
            .combo_losses(params("Knight,Archers"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
    }
}
