//! Per-transaction journal kept next to the simulated chain

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{constants::MAX_JOURNAL_COLLECTIONS, utils::error::StrategyResult};

/// Category of a journal entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LogType {
    /// Informational step of a transaction
    Info,
    /// Outcome of a whole transaction
    ExecutionResult,
    /// Token swap performed on a venue
    Swap,
    /// Strategy report to the vault
    Report,
}

/// Journal entry
#[derive(Clone, Debug)]
pub struct JournalEntry {
    /// Block timestamp in seconds
    pub timestamp: u64,
    pub entry: StrategyResult<()>,
    pub log_type: LogType,
    pub note: Option<String>,
}

/// Builder for journal entries
impl JournalEntry {
    /// Create a new instance of a journal entry
    /// Fills the `timestamp`, `entry` and `log_type` fields
    pub fn new(timestamp: u64, entry: StrategyResult<()>, log_type: LogType) -> Self {
        Self {
            timestamp,
            entry,
            log_type,
            note: None,
        }
    }

    /// Fills the `note` field of the entry
    pub fn note<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        self.note = Some(text.as_ref().to_string());
        self
    }

    /// Renders the entry as one log line.
    pub fn render(&self) -> String {
        let time = DateTime::<Utc>::from_timestamp(self.timestamp as i64, 0)
            .map(|time| time.to_rfc3339())
            .unwrap_or_else(|| self.timestamp.to_string());
        let outcome = match &self.entry {
            Ok(()) => "ok".to_string(),
            Err(err) => format!("err({})", err),
        };
        format!(
            "[{}] {:?} {} {}",
            time,
            self.log_type,
            outcome,
            self.note.as_deref().unwrap_or_default()
        )
    }
}

/// Entries recorded while executing one transaction.
#[derive(Clone, Debug)]
pub struct JournalCollection {
    /// Label of the transaction, e.g. `strategy.harvest`
    pub label: String,
    /// Block timestamp when the transaction started
    pub start: u64,
    pub entries: Vec<JournalEntry>,
}

impl JournalCollection {
    pub fn open<S: AsRef<str>>(label: S, start: u64) -> Self {
        Self {
            label: label.as_ref().to_string(),
            start,
            entries: vec![],
        }
    }

    /// Appends a note stamped with the collection's start time.
    pub fn append_note<S: AsRef<str>>(
        &mut self,
        entry: StrategyResult<()>,
        log_type: LogType,
        note: S,
    ) {
        let mut journal_entry = JournalEntry::new(self.start, entry, log_type);
        journal_entry.note(note);
        self.entries.push(journal_entry);
    }

    /// The transaction failed if its last `ExecutionResult` entry is an error.
    pub fn failed(&self) -> bool {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.log_type == LogType::ExecutionResult)
            .is_some_and(|entry| entry.entry.is_err())
    }
}

/// Bounded journal of the most recent transactions.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    collections: VecDeque<JournalCollection>,
}

impl Journal {
    /// Stores a closed collection, dropping the oldest ones above the cap.
    pub fn commit(&mut self, collection: JournalCollection) {
        self.collections.push_back(collection);
        self.cleanup();
    }

    /// Removes excess collections while maintaining the most recent `MAX_JOURNAL_COLLECTIONS`.
    fn cleanup(&mut self) {
        while self.collections.len() > MAX_JOURNAL_COLLECTIONS {
            self.collections.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn last(&self) -> Option<&JournalCollection> {
        self.collections.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JournalCollection> {
        self.collections.iter()
    }

    /// Collections recorded for transactions with the given label
    pub fn by_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a JournalCollection> {
        self.collections
            .iter()
            .filter(move |collection| collection.label == label)
    }
}
