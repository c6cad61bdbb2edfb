//! Fixed-depth log of post-move board snapshots used for ko detection.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::KO_HISTORY_DEPTH;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KoHistory {
    snapshots: VecDeque<String>,
}

impl KoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot, keeping only the most recent `KO_HISTORY_DEPTH`.
    pub fn record(&mut self, snapshot: String) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > KO_HISTORY_DEPTH {
            self.snapshots.pop_front();
        }
    }

    pub fn contains(&self, snapshot: &str) -> bool {
        self.snapshots.iter().any(|s| s == snapshot)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.snapshots.iter().map(String::as_str)
    }

    /// Imported histories longer than the depth keep their newest entries.
    pub(crate) fn truncated(mut self) -> Self {
        while self.snapshots.len() > KO_HISTORY_DEPTH {
            self.snapshots.pop_front();
        }
        self
    }
}
