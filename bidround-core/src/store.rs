//! The store: single writer over the projection and its event log
//!
//! All mutation funnels through [`Store::submit`], which holds the write
//! lock for the whole validate, append, apply sequence. Reads take the
//! read lock and hand out copies, so no caller ever holds a reference
//! into store-owned memory. One store instance is created at process
//! start and shared by handle with every collaborator.

use crate::error::{Result, StoreError, ValidationError};
use crate::event::{Event, LogEntry};
use crate::journal::Journal;
use crate::types::{Participant, ParticipantId, Projection, RoundState};
use parking_lot::RwLock;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Generated participant ids are drawn from `0..ID_SPACE`
const ID_SPACE: u32 = 100_000_000;

/// Colliding draws tolerated before create gives up
///
/// The id space is large enough that hitting this cap means the space is
/// effectively exhausted, which is reported as an infrastructure error
/// rather than looping forever.
const MAX_CREATE_ATTEMPTS: usize = 1000;

/// Tunables for a store instance
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Lowest accepted offer in cents
    pub min_offer: i64,
    /// Sync the log file after every append
    pub fsync_on_write: bool,
}

struct Inner {
    projection: Projection,
    journal: Journal,
}

/// Thread-safe, event-sourced state of one bidding round
pub struct Store {
    inner: RwLock<Inner>,
    config: StoreConfig,
}

impl Store {
    /// Open the log at `path`, replay it and wrap the result.
    ///
    /// A missing log file starts an empty round; a log that cannot be
    /// read or parsed is fatal here, before any caller sees the store.
    pub fn open(path: impl Into<PathBuf>, config: StoreConfig) -> Result<Self> {
        let journal = Journal::new(path, config.fsync_on_write);
        let projection = journal.replay()?;

        info!(
            "Store: opened {:?}, {} participants, round in the {} phase",
            journal.path(),
            projection.participants.len(),
            projection.round
        );

        Ok(Self {
            inner: RwLock::new(Inner {
                projection,
                journal,
            }),
            config,
        })
    }

    /// Validate, durably append, then apply one event.
    ///
    /// A rejected event never reaches the log. A failed append never
    /// reaches memory, so the projection only ever reflects records the
    /// log confirmed.
    pub fn submit(&self, event: Event) -> Result<()> {
        let mut inner = self.inner.write();
        let Inner {
            projection,
            journal,
        } = &mut *inner;

        event.validate(projection, self.config.min_offer)?;

        let entry = LogEntry::stamp(event);
        journal.append(&entry)?;
        entry.event.apply(projection);
        Ok(())
    }

    /// Register a participant under a fresh random id.
    ///
    /// Collisions with existing ids retry with a new draw; any other
    /// failure is returned as is.
    pub fn create_participant(&self, payload: Value, as_admin: bool) -> Result<ParticipantId> {
        let mut rng = rand::thread_rng();

        for _ in 0..MAX_CREATE_ATTEMPTS {
            let id: ParticipantId = rng.gen_range(0..ID_SPACE).to_string();
            match self.submit(Event::Create {
                id: id.clone(),
                payload: payload.clone(),
                as_admin,
            }) {
                Ok(()) => {
                    info!("Store: created participant {id}");
                    return Ok(id);
                }
                Err(StoreError::Invalid(ValidationError::IdTaken(_))) => continue,
                Err(err) => return Err(err),
            }
        }

        Err(StoreError::IdSpaceExhausted(MAX_CREATE_ATTEMPTS))
    }

    /// Replace a participant's payload, returning the stored value.
    pub fn update_participant(
        &self,
        id: &str,
        payload: Value,
        as_admin: bool,
    ) -> Result<Value> {
        let stored = payload.clone();
        self.submit(Event::Update {
            id: id.to_string(),
            payload,
            as_admin,
        })?;
        Ok(stored)
    }

    /// Remove a participant. Removing an absent id is not an error.
    pub fn delete_participant(&self, id: &str, as_admin: bool) -> Result<()> {
        debug!("Store: deleting participant {id} (admin={as_admin})");
        self.submit(Event::Delete { id: id.to_string() })
    }

    /// Set a participant's offer amount in cents.
    pub fn set_offer(&self, id: &str, amount: i64, as_admin: bool) -> Result<()> {
        self.submit(Event::SetOffer {
            id: id.to_string(),
            amount,
            as_admin,
        })
    }

    /// Move the round to the phase with the given ordinal.
    pub fn set_round_state(&self, ordinal: u8) -> Result<()> {
        self.submit(Event::SetRoundState { state: ordinal })?;
        if let Some(state) = RoundState::from_ordinal(ordinal) {
            info!("Store: round moved to the {state} phase");
        }
        Ok(())
    }

    /// Copy of one participant record
    pub fn participant(&self, id: &str) -> Option<Participant> {
        self.inner.read().projection.participants.get(id).cloned()
    }

    /// Point-in-time snapshot of all participants
    pub fn participants(&self) -> HashMap<ParticipantId, Participant> {
        self.inner.read().projection.participants.clone()
    }

    /// A participant's offer in cents, 0 when absent or never set
    pub fn offer(&self, id: &str) -> i64 {
        self.inner
            .read()
            .projection
            .participants
            .get(id)
            .map(|p| p.offer)
            .unwrap_or(0)
    }

    /// Current phase of the round
    pub fn round_state(&self) -> RoundState {
        self.inner.read().projection.round
    }
}
