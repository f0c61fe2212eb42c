//! Completion ledger
//!
//! Maps activity ids to the simulated day they were marked complete. The
//! ledger is owned by the caller and persisted between requests through a
//! `LedgerStore`; the engine only borrows it for the duration of one run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ActivityId, Day, LedgerError};

/// What a completion toggle did to the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Completion recorded on the current day
    Recorded,
    /// Completion recorded on the current day was removed
    Cleared,
    /// Completed on an earlier day; left untouched
    Unchanged,
}

/// Activity id -> completion day
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionLedger {
    entries: BTreeMap<ActivityId, Day>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn completion_day(&self, id: &str) -> Option<Day> {
        self.entries.get(id).copied()
    }

    /// Record completion, replacing any earlier record
    pub fn record(&mut self, id: impl Into<String>, day: Day) {
        self.entries.insert(id.into(), day);
    }

    /// Mark an activity as not completed
    pub fn remove(&mut self, id: &str) -> Option<Day> {
        self.entries.remove(id)
    }

    /// Completed on or before `day`
    pub fn is_completed_by(&self, id: &str, day: Day) -> bool {
        self.completion_day(id).is_some_and(|d| d <= day)
    }

    /// Flip the completion state of an activity on the current day.
    ///
    /// A record dated after `current_day` is treated as not yet completed and
    /// is moved to `current_day`.
    pub fn toggle(&mut self, id: &str, current_day: Day) -> ToggleOutcome {
        match self.completion_day(id) {
            None => {
                self.record(id, current_day);
                ToggleOutcome::Recorded
            }
            Some(day) if day > current_day => {
                self.record(id, current_day);
                ToggleOutcome::Recorded
            }
            Some(day) if day == current_day => {
                self.entries.remove(id);
                ToggleOutcome::Cleared
            }
            Some(_) => ToggleOutcome::Unchanged,
        }
    }

    /// Drop every completion recorded after `day`, returning the dropped ids
    pub fn rollback_to(&mut self, day: Day) -> Vec<ActivityId> {
        let dropped: Vec<ActivityId> = self
            .entries
            .iter()
            .filter(|(_, &d)| d > day)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &dropped {
            self.entries.remove(id);
        }
        dropped
    }

    pub fn latest_completion_day(&self) -> Option<Day> {
        self.entries.values().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Day)> {
        self.entries.iter().map(|(id, &day)| (id.as_str(), day))
    }
}

impl FromIterator<(ActivityId, Day)> for CompletionLedger {
    fn from_iter<I: IntoIterator<Item = (ActivityId, Day)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Caller-owned persistence for the completion ledger
pub trait LedgerStore {
    fn load(&self) -> Result<CompletionLedger, LedgerError>;

    fn save(&mut self, ledger: &CompletionLedger) -> Result<(), LedgerError>;
}

/// In-memory store, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledger: CompletionLedger,
}

impl MemoryLedgerStore {
    pub fn new(ledger: CompletionLedger) -> Self {
        Self { ledger }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<CompletionLedger, LedgerError> {
        Ok(self.ledger.clone())
    }

    fn save(&mut self, ledger: &CompletionLedger) -> Result<(), LedgerError> {
        self.ledger = ledger.clone();
        Ok(())
    }
}
