//! Append-only event log
//!
//! One JSON record per line, each self-describing (type tag, timestamp,
//! payload). The file on disk is the durable source of truth; the
//! in-memory projection is rebuilt from it by replay on every start.
//! Records are never rewritten or deleted.

use crate::error::{Result, StoreError};
use crate::event::LogEntry;
use crate::types::Projection;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle to the backing log file
///
/// Appends open the file anew each time, so a journal holds no file
/// descriptor between writes. Exclusivity is the store's job: only its
/// write path ever appends.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    fsync_on_write: bool,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>, fsync_on_write: bool) -> Self {
        Self {
            path: path.into(),
            fsync_on_write,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file on first write.
    ///
    /// Returns only after the write call has succeeded; with
    /// `fsync_on_write` the file is additionally synced to disk.
    pub fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let line = serde_json::to_string(entry).map_err(StoreError::Encode)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        if self.fsync_on_write {
            file.sync_all()?;
        }

        debug!("Journal: appended {} event", entry.event.tag());
        Ok(())
    }

    /// Rebuild a projection from the log.
    ///
    /// A missing file is an empty round, not an error. Anything else that
    /// stops the replay (unreadable file, unknown tag, unparsable payload)
    /// is fatal: the caller must not start with a partially replayed state.
    pub fn replay(&self) -> Result<Projection> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("Journal: no log at {:?}, starting empty", self.path);
                return Ok(Projection::default());
            }
            Err(err) => return Err(err.into()),
        };

        Self::replay_from(BufReader::new(file))
    }

    /// Replay records from any reader, blank lines skipped.
    ///
    /// Events are applied without re-validation; the log is trusted to
    /// contain only events that were valid when they were appended.
    pub fn replay_from<R: BufRead>(reader: R) -> Result<Projection> {
        let mut projection = Projection::default();
        let mut line_num = 0;
        let mut applied = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|source| StoreError::Corrupt {
                    line: line_num,
                    source,
                })?;
            entry.event.apply(&mut projection);
            applied += 1;
        }

        info!(
            "Journal: replayed {} events, {} participants",
            applied,
            projection.participants.len()
        );
        Ok(projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::types::RoundState;
    use serde_json::json;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_append_then_replay_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("db.jsonl");

        {
            let mut journal = Journal::new(&path, false);
            journal.append(&LogEntry::stamp(Event::Create {
                id: "42".to_string(),
                payload: json!({"name": "hugo"}),
                as_admin: false,
            }))?;
            journal.append(&LogEntry::stamp(Event::SetRoundState { state: 3 }))?;
            journal.append(&LogEntry::stamp(Event::SetOffer {
                id: "42".to_string(),
                amount: 5000,
                as_admin: false,
            }))?;
        }

        let journal = Journal::new(&path, false);
        let projection = journal.replay()?;

        assert_eq!(projection.round, RoundState::Offer);
        assert_eq!(projection.participants["42"].payload, json!({"name": "hugo"}));
        assert_eq!(projection.participants["42"].offer, 5000);
        Ok(())
    }

    #[test]
    fn test_missing_file_replays_empty() -> Result<()> {
        let dir = tempdir()?;
        let journal = Journal::new(dir.path().join("nothing-here.jsonl"), false);

        let projection = journal.replay()?;
        assert_eq!(projection, Projection::default());
        Ok(())
    }

    #[test]
    fn test_append_survives_reopen() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("db.jsonl");

        {
            let mut journal = Journal::new(&path, false);
            journal.append(&LogEntry::stamp(Event::Create {
                id: "1".to_string(),
                payload: json!({}),
                as_admin: false,
            }))?;
        }
        {
            let mut journal = Journal::new(&path, false);
            journal.append(&LogEntry::stamp(Event::Create {
                id: "2".to_string(),
                payload: json!({}),
                as_admin: false,
            }))?;
        }

        let projection = Journal::new(&path, false).replay()?;
        assert_eq!(projection.participants.len(), 2);
        Ok(())
    }

    #[test]
    fn test_replay_from_inline_log() -> Result<()> {
        let log = r#"
{"type":"create","time":"2021-03-01 18:00:00","payload":{"id":"1234","payload":{"name":"hugo","adresse":"haus am wald"}}}
{"type":"create","time":"2021-03-01 18:05:00","payload":{"id":"4321","payload":{"name":"erik","adresse":"nachbarhaus"}}}

{"type":"update","time":"2021-03-01 19:00:00","payload":{"id":"1234","payload":{"name":"hugo","adresse":"beim wald"}}}
{"type":"set_round_state","time":"2021-03-02 09:00:00","payload":{"state":2}}
"#;

        let projection = Journal::replay_from(Cursor::new(log))?;

        assert_eq!(projection.participants.len(), 2);
        assert_eq!(
            projection.participants["1234"].payload,
            json!({"name": "hugo", "adresse": "beim wald"})
        );
        assert_eq!(
            projection.participants["4321"].payload,
            json!({"name": "erik", "adresse": "nachbarhaus"})
        );
        assert_eq!(projection.round, RoundState::Validation);
        Ok(())
    }

    #[test]
    fn test_corrupt_line_is_fatal_with_line_number() {
        let log = concat!(
            r#"{"type":"create","time":"2021-03-01 18:00:00","payload":{"id":"1","payload":{}}}"#,
            "\n",
            "this is not json\n",
        );

        match Journal::replay_from(Cursor::new(log)) {
            Err(StoreError::Corrupt { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected corrupt log error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let log = r#"{"type":"explode","time":"2021-03-01 18:00:00","payload":{}}"#;

        match Journal::replay_from(Cursor::new(log)) {
            Err(StoreError::Corrupt { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected corrupt log error, got {other:?}"),
        }
    }

    #[test]
    fn test_append_writes_one_line_per_event() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("db.jsonl");

        let mut journal = Journal::new(&path, true);
        journal.append(&LogEntry::stamp(Event::Delete {
            id: "7".to_string(),
        }))?;
        journal.append(&LogEntry::stamp(Event::SetRoundState { state: 1 }))?;

        let raw = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = raw.trim_end().lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(serde_json::from_str::<LogEntry>(line).is_ok());
        }
        Ok(())
    }
}
