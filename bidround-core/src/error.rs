//! Store error types
//!
//! Two layers: validation errors are client-caused and reported back to
//! the caller that submitted the event; everything else in `StoreError`
//! is infrastructure trouble (log I/O, serialization, a log that does
//! not parse at bootstrap).

use crate::types::{ParticipantId, RoundState};
use thiserror::Error;

/// Rejection of an event by its validation rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("participant {0:?} already exists")]
    IdTaken(ParticipantId),

    #[error("participant {0:?} does not exist")]
    UnknownParticipant(ParticipantId),

    #[error("no payload supplied")]
    EmptyPayload,

    #[error("offer of {amount} is below the floor of {floor}")]
    OfferTooLow { amount: i64, floor: i64 },

    #[error("{0} is not a valid round state")]
    BadRoundState(u8),

    #[error("not allowed while the round is in the {0} phase")]
    WrongPhase(RoundState),
}

/// Combined store error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("event log i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("event log line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },

    #[error("no unused participant id after {0} attempts")]
    IdSpaceExhausted(usize),
}

pub type Result<T> = std::result::Result<T, StoreError>;
