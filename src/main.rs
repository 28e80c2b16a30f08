use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use battle_meta::config::AppConfig;
use battle_meta::query::{
    AnalyticsEngine, CardStatsParams, ComboLossParams, PopularityParams, QueryError,
    TopDecksParams, UnderdogParams, WinningCombosParams,
};
use battle_meta::storage::{JsonlBattleStore, JsonlCardCatalog, StorageConfig};

#[derive(Parser)]
#[command(name = "battle-meta")]
#[command(about = "Card, deck and combo analytics over recorded battles")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Date range shared by the time-bounded queries.
#[derive(clap::Args)]
struct RangeArgs {
    /// Start date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    start: String,

    /// End date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    end: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Most used cards among top-ranked players
    Popular {
        /// Global rank cutoff
        #[arg(long)]
        max_rank: Option<u32>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Least used cards among top-ranked players
    LeastPopular {
        /// Global rank cutoff
        #[arg(long)]
        max_rank: Option<u32>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Win and loss percentages per card
    CardStats {
        #[command(flatten)]
        range: RangeArgs,

        /// Minimum battles per card
        #[arg(long)]
        min_sample: Option<u64>,
    },

    /// Best decks above a win-rate threshold
    TopDecks {
        #[command(flatten)]
        range: RangeArgs,

        /// Win percentage a deck must exceed (0-100)
        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        min_sample: Option<u64>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Losses while fielding two given cards
    ComboLoss {
        /// Two card names, "A,B" or '["A","B"]'
        #[arg(long)]
        combo: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Wins with a card against stronger opponents
    Underdog {
        #[arg(long)]
        card_id: u32,

        /// Minimum trophy deficit in percent
        #[arg(long)]
        trophy_percentage: f64,

        /// Crowns the opponents took
        #[arg(long)]
        towers: u32,
    },

    /// Best k-card combinations
    WinningCombos {
        /// Cards per combo (2-8)
        #[arg(long)]
        size: usize,

        /// Minimum win percentage (0-100)
        #[arg(long)]
        threshold: Option<f64>,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long)]
        min_sample: Option<u64>,

        #[arg(long)]
        limit: Option<usize>,

        /// Combos enumerated per battle
        #[arg(long)]
        max_per_battle: Option<usize>,
    },

    /// Battle count, outcomes and covered period
    Overview,

    /// Most recent battles
    RecentBattles {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Every card in the catalog
    Cards,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize tracing; stdout is reserved for reports
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting battle-meta v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    if !storage.data_dir.exists() {
        tracing::warn!("Data directory {:?} does not exist", storage.data_dir);
    }
    let engine = AnalyticsEngine::new(
        Arc::new(JsonlBattleStore::new(&storage)),
        Arc::new(JsonlCardCatalog::new(&storage)),
        config.engine.clone(),
    );

    match cli.command {
        Commands::Popular { max_rank, limit } => {
            emit(engine.popular_cards(PopularityParams { max_rank, limit }).await)
        }
        Commands::LeastPopular { max_rank, limit } => emit(
            engine
                .least_popular_cards(PopularityParams { max_rank, limit })
                .await,
        ),
        Commands::CardStats { range, min_sample } => emit(
            engine
                .card_stats(CardStatsParams {
                    start_date: Some(range.start),
                    end_date: Some(range.end),
                    min_sample,
                })
                .await,
        ),
        Commands::TopDecks {
            range,
            threshold,
            min_sample,
            limit,
        } => emit(
            engine
                .top_decks(TopDecksParams {
                    start_date: Some(range.start),
                    end_date: Some(range.end),
                    win_rate_threshold: threshold,
                    min_sample,
                    limit,
                })
                .await,
        ),
        Commands::ComboLoss { combo, range } => emit(
            engine
                .combo_losses(ComboLossParams {
                    combo: Some(combo),
                    start_date: Some(range.start),
                    end_date: Some(range.end),
                })
                .await,
        ),
        Commands::Underdog {
            card_id,
            trophy_percentage,
            towers,
        } => emit(
            engine
                .underdog_victories(UnderdogParams {
                    card_id: Some(card_id),
                    trophy_percentage: Some(trophy_percentage),
                    towers_destroyed: Some(towers),
                })
                .await,
        ),
        Commands::WinningCombos {
            size,
            threshold,
            range,
            min_sample,
            limit,
            max_per_battle,
        } => emit(
            engine
                .winning_combos(WinningCombosParams {
                    combo_size: Some(size),
                    win_rate_threshold: threshold,
                    start_date: Some(range.start),
                    end_date: Some(range.end),
                    min_sample,
                    limit,
                    max_combos_per_battle: max_per_battle,
                })
                .await,
        ),
        Commands::Overview => emit(engine.battle_overview().await),
        Commands::RecentBattles { limit } => emit(engine.recent_battles(limit).await),
        Commands::Cards => emit(engine.card_list().await),
    }
}

/// Print a report as pretty JSON, or the error body with a per-kind exit code.
fn emit<T: Serialize>(result: Result<T, QueryError>) -> Result<()> {
    match result {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Query failed: {}", e);
            println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            let code = match e {
                QueryError::Validation(_) => 2,
                QueryError::NotFound { .. } => 3,
                QueryError::Store(_) => 4,
            };
            std::process::exit(code);
        }
    }
}
