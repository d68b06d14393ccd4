//! Bidround Core Library
//!
//! Event-sourced state store for a recurring produce-subscription bidding
//! round: participants register, maintain their contact and bank details,
//! and place a monetary offer while an administrator steers the round
//! through its phases. Every accepted change is appended to a JSON-lines
//! event log; the in-memory state is a projection rebuilt by replaying
//! that log on startup.

pub mod error;
pub mod event;
pub mod journal;
pub mod store;
pub mod types;

pub use error::{Result, StoreError, ValidationError};
pub use event::{Event, LogEntry};
pub use journal::Journal;
pub use store::{Store, StoreConfig};
pub use types::{Participant, ParticipantId, Projection, RoundState};
