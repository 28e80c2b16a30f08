//! Core data models for battle analytics.

mod battle;
mod card;
mod signature;
mod stats;

pub use battle::*;
pub use card::{CardId, CardMetadata, CardRef, IconUrls, Rarity};
pub use signature::*;
pub use stats::*;
