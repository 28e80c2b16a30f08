//! Battle and participant models.
//!
//! Battles are stored from the primary player's point of view: the
//! top-level `tag`, `cards` and `hasWon` belong to the player whose battle
//! log was collected, `team` holds their partners in 2v2 modes and
//! `opponents` the other side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::card::null_as_default;
use super::{CardId, CardRef};

/// One side of a battle other than the primary player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Player tag
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: Vec<CardRef>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub support_cards: Vec<CardRef>,

    #[serde(default)]
    pub starting_trophies: Option<u32>,

    #[serde(default)]
    pub current_global_rank: Option<u32>,

    /// Crowns taken (towers destroyed) by this participant
    #[serde(default)]
    pub crowns: Option<u32>,
}

impl Participant {
    /// Create a participant with no cards.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the deck.
    pub fn with_cards(mut self, cards: Vec<CardRef>) -> Self {
        self.cards = cards;
        self
    }

    /// Builder method to set the support cards.
    pub fn with_support_cards(mut self, cards: Vec<CardRef>) -> Self {
        self.support_cards = cards;
        self
    }

    /// Builder method to set starting trophies.
    pub fn with_trophies(mut self, trophies: u32) -> Self {
        self.starting_trophies = Some(trophies);
        self
    }

    /// Builder method to set crowns.
    pub fn with_crowns(mut self, crowns: u32) -> Self {
        self.crowns = Some(crowns);
        self
    }
}

/// A recorded match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    /// When the battle was played
    pub battle_time: DateTime<Utc>,

    /// Primary player tag
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,

    /// Whether the primary player (and their team) won
    #[serde(default)]
    pub has_won: bool,

    #[serde(default)]
    pub is_team_battle: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: Vec<CardRef>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub support_cards: Vec<CardRef>,

    /// Teammates of the primary player (2v2 only)
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: Vec<Participant>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub opponents: Vec<Participant>,

    #[serde(default)]
    pub current_global_rank: Option<u32>,

    #[serde(default)]
    pub starting_trophies: Option<u32>,

    #[serde(default)]
    pub crowns: Option<u32>,
}

/// Which side of the battle a participant played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Teammate,
    Opponent,
}

impl Role {
    /// Outcome for a participant in this role, given the primary result.
    pub fn won(&self, primary_won: bool) -> bool {
        match self {
            Role::Primary | Role::Teammate => primary_won,
            Role::Opponent => !primary_won,
        }
    }
}

/// Borrowed view of one player's contribution to a battle.
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    pub role: Role,
    pub tag: &'a str,
    pub cards: &'a [CardRef],
    pub support_cards: &'a [CardRef],
}

impl<'a> Side<'a> {
    /// Deck and support cards together.
    pub fn all_cards(&self) -> impl Iterator<Item = &'a CardRef> {
        self.cards.iter().chain(self.support_cards.iter())
    }
}

impl Battle {
    /// Create a battle with no cards or opponents.
    pub fn new(battle_time: DateTime<Utc>, tag: impl Into<String>, has_won: bool) -> Self {
        Self {
            battle_time,
            tag: tag.into(),
            has_won,
            is_team_battle: false,
            cards: Vec::new(),
            support_cards: Vec::new(),
            team: Vec::new(),
            opponents: Vec::new(),
            current_global_rank: None,
            starting_trophies: None,
            crowns: None,
        }
    }

    /// Builder method to set the primary deck.
    pub fn with_cards(mut self, cards: Vec<CardRef>) -> Self {
        self.cards = cards;
        self
    }

    /// Builder method to set the primary support cards.
    pub fn with_support_cards(mut self, cards: Vec<CardRef>) -> Self {
        self.support_cards = cards;
        self
    }

    /// Builder method to add a teammate; marks the battle as a team battle.
    pub fn with_teammate(mut self, teammate: Participant) -> Self {
        self.team.push(teammate);
        self.is_team_battle = true;
        self
    }

    /// Builder method to add an opponent.
    pub fn with_opponent(mut self, opponent: Participant) -> Self {
        self.opponents.push(opponent);
        self
    }

    /// Builder method to set the primary player's global rank.
    pub fn with_global_rank(mut self, rank: u32) -> Self {
        self.current_global_rank = Some(rank);
        self
    }

    /// Builder method to set the primary player's starting trophies.
    pub fn with_trophies(mut self, trophies: u32) -> Self {
        self.starting_trophies = Some(trophies);
        self
    }

    /// Builder method to set the primary player's crowns.
    pub fn with_crowns(mut self, crowns: u32) -> Self {
        self.crowns = Some(crowns);
        self
    }

    /// The primary player's side.
    pub fn primary(&self) -> Side<'_> {
        Side {
            role: Role::Primary,
            tag: &self.tag,
            cards: &self.cards,
            support_cards: &self.support_cards,
        }
    }

    /// Every side of the battle: primary first, then teammates, then opponents.
    pub fn sides(&self) -> impl Iterator<Item = Side<'_>> {
        let team = self.team.iter().map(|p| side_of(p, Role::Teammate));
        let opponents = self.opponents.iter().map(|p| side_of(p, Role::Opponent));
        std::iter::once(self.primary()).chain(team).chain(opponents)
    }

    /// Whether the primary player's own deck or support cards include `card_id`.
    pub fn primary_uses(&self, card_id: CardId) -> bool {
        self.primary().all_cards().any(|c| c.id == card_id)
    }

    /// Whether any teammate's deck or support cards include `card_id`.
    pub fn team_uses(&self, card_id: CardId) -> bool {
        self.team
            .iter()
            .any(|p| p.cards.iter().chain(&p.support_cards).any(|c| c.id == card_id))
    }

    /// Highest starting trophy count among opponents (0 when unknown).
    pub fn max_opponent_trophies(&self) -> u32 {
        self.opponents
            .iter()
            .filter_map(|o| o.starting_trophies)
            .max()
            .unwrap_or(0)
    }

    /// Highest crown count among opponents (0 when unknown).
    pub fn max_opponent_crowns(&self) -> u32 {
        self.opponents
            .iter()
            .map(|o| o.crowns.unwrap_or(0))
            .max()
            .unwrap_or(0)
    }
}

fn side_of(participant: &Participant, role: Role) -> Side<'_> {
    Side {
        role,
        tag: &participant.tag,
        cards: &participant.cards,
        support_cards: &participant.support_cards,
    }
}
