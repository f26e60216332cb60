//! Recent certification runs, newest first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::certification::RunCounters;

/// Maximum number of runs to retain.
const MAX_HISTORY_ENTRIES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: u64,
    pub device: Option<String>,
    pub counters: RunCounters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunHistory {
    entries: VecDeque<RunRecord>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Add a run to the front, evicting the oldest once full.
    pub fn push(&mut self, record: RunRecord) {
        if self.entries.len() >= MAX_HISTORY_ENTRIES {
            self.entries.pop_back();
        }
        self.entries.push_front(record);
    }

    pub fn entries(&self) -> &VecDeque<RunRecord> {
        &self.entries
    }
}
