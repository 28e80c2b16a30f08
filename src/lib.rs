//! # Battle Meta
//!
//! Card, deck and combo analytics over recorded card-battle matches.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (battles, participants, cards, signatures, tallies)
//! - **storage**: Read-only battle store and card catalog (JSONL, in-memory)
//! - **calculate**: Extraction, counting, combo enumeration and ranking
//! - **query**: The analytics engine and its operations
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod models;
pub mod query;
pub mod storage;

pub use models::*;
pub use query::{AnalyticsEngine, QueryError};
