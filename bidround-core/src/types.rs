//! Core types for the bidding round store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Unique identifier for a participant
pub type ParticipantId = String;

/// Phase of the bidding round
///
/// The phase gates which events non-admin callers may submit. `Invalid`
/// is the zero sentinel; a freshly bootstrapped round starts in
/// `Registration` and only reaches `Invalid` by replaying a log that was
/// edited or corrupted outside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundState {
    Invalid,
    Registration,
    Validation,
    Offer,
}

impl RoundState {
    /// Map a wire ordinal to a phase. Returns `None` for unknown ordinals.
    pub fn from_ordinal(n: u8) -> Option<Self> {
        match n {
            0 => Some(RoundState::Invalid),
            1 => Some(RoundState::Registration),
            2 => Some(RoundState::Validation),
            3 => Some(RoundState::Offer),
            _ => None,
        }
    }

    /// Wire ordinal of this phase
    pub fn ordinal(self) -> u8 {
        match self {
            RoundState::Invalid => 0,
            RoundState::Registration => 1,
            RoundState::Validation => 2,
            RoundState::Offer => 3,
        }
    }
}

impl Default for RoundState {
    fn default() -> Self {
        RoundState::Registration
    }
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundState::Invalid => write!(f, "invalid"),
            RoundState::Registration => write!(f, "registration"),
            RoundState::Validation => write!(f, "validation"),
            RoundState::Offer => write!(f, "offer"),
        }
    }
}

/// One registered participant
///
/// The payload is free-form client data (name, address, bank account and
/// so on); the store never looks inside it. The offer is an amount in
/// minor currency units (cents).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub payload: Value,
    pub offer: i64,
}

/// In-memory state of the round, derived from the event log
///
/// A projection is a cache: replaying the log from the start always
/// reproduces it exactly. It is owned by the store; everything handed out
/// to callers is a copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub participants: HashMap<ParticipantId, Participant>,
    pub round: RoundState,
}
