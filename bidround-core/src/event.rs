//! Change events for the bidding round
//!
//! Every mutation of the store is one of a closed set of events. An event
//! validates itself against the current projection before it is durably
//! logged, and applies itself to the projection afterwards. Validation is
//! the only place that can fail; `apply` is infallible so that replaying
//! an already-accepted log never aborts halfway.

use crate::error::ValidationError;
use crate::types::{Participant, ParticipantId, Projection, RoundState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timestamp layout used in log records
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One accepted change to the round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    /// Register a new participant
    Create {
        id: ParticipantId,
        payload: Value,
        #[serde(default)]
        as_admin: bool,
    },

    /// Replace a participant's payload
    Update {
        id: ParticipantId,
        payload: Value,
        #[serde(default)]
        as_admin: bool,
    },

    /// Remove a participant
    Delete { id: ParticipantId },

    /// Set a participant's offer amount (cents)
    SetOffer {
        id: ParticipantId,
        amount: i64,
        #[serde(default)]
        as_admin: bool,
    },

    /// Move the round to another phase
    SetRoundState { state: u8 },
}

impl Event {
    /// Stable tag used in the log and in log messages
    pub fn tag(&self) -> &'static str {
        match self {
            Event::Create { .. } => "create",
            Event::Update { .. } => "update",
            Event::Delete { .. } => "delete",
            Event::SetOffer { .. } => "set_offer",
            Event::SetRoundState { .. } => "set_round_state",
        }
    }

    /// Check this event against the projection it would be applied to.
    ///
    /// Admin-issued events bypass the phase gates but not existence or
    /// floor checks. Runs under the store's write lock, strictly before
    /// the event is appended to the log.
    pub fn validate(
        &self,
        projection: &Projection,
        min_offer: i64,
    ) -> Result<(), ValidationError> {
        match self {
            Event::Create { id, .. } => {
                if projection.participants.contains_key(id) {
                    return Err(ValidationError::IdTaken(id.clone()));
                }
                Ok(())
            }
            Event::Update {
                id,
                payload,
                as_admin,
            } => {
                if !projection.participants.contains_key(id) {
                    return Err(ValidationError::UnknownParticipant(id.clone()));
                }
                if !as_admin && projection.round != RoundState::Registration {
                    return Err(ValidationError::WrongPhase(projection.round));
                }
                if payload.is_null() {
                    return Err(ValidationError::EmptyPayload);
                }
                Ok(())
            }
            Event::Delete { .. } => Ok(()),
            Event::SetOffer {
                id,
                amount,
                as_admin,
            } => {
                if !projection.participants.contains_key(id) {
                    return Err(ValidationError::UnknownParticipant(id.clone()));
                }
                if !as_admin && projection.round != RoundState::Offer {
                    return Err(ValidationError::WrongPhase(projection.round));
                }
                if *amount < min_offer {
                    return Err(ValidationError::OfferTooLow {
                        amount: *amount,
                        floor: min_offer,
                    });
                }
                Ok(())
            }
            Event::SetRoundState { state } => match RoundState::from_ordinal(*state) {
                Some(s) if s != RoundState::Invalid => Ok(()),
                _ => Err(ValidationError::BadRoundState(*state)),
            },
        }
    }

    /// Apply this event to the projection.
    ///
    /// Replay applies blindly, so a target id missing here can only come
    /// from a log edited outside the store; the record is then created on
    /// the spot and the projection is whatever the log says it is.
    pub fn apply(self, projection: &mut Projection) {
        match self {
            Event::Create { id, payload, .. } => {
                projection
                    .participants
                    .insert(id, Participant { payload, offer: 0 });
            }
            Event::Update { id, payload, .. } => {
                projection
                    .participants
                    .entry(id)
                    .or_insert_with(Participant::default)
                    .payload = payload;
            }
            Event::Delete { id } => {
                projection.participants.remove(&id);
            }
            Event::SetOffer { id, amount, .. } => {
                projection
                    .participants
                    .entry(id)
                    .or_insert_with(Participant::default)
                    .offer = amount;
            }
            Event::SetRoundState { state } => {
                projection.round =
                    RoundState::from_ordinal(state).unwrap_or(RoundState::Invalid);
            }
        }
    }
}

/// One line of the event log: the tagged event plus a wall-clock stamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(flatten)]
    pub event: Event,
    pub time: String,
}

impl LogEntry {
    /// Wrap an event with the current local time
    pub fn stamp(event: Event) -> Self {
        Self {
            event,
            time: chrono::Local::now().format(TIME_FORMAT).to_string(),
        }
    }
}
