//! Append-only, capacity-bounded log of resolved rounds.

use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How one bet fared at resolution. `profit` is the amount credited for a
/// win and zero for a loss; a lost stake equals `amount`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetSettlement {
    pub outcome: Outcome,
    pub amount: u64,
    pub won: bool,
    pub profit: u64,
}

/// Immutable record of one resolved round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundHistoryEntry {
    pub round_id: u64,
    pub winner: Outcome,
    /// Credited winnings minus everything staked this round.
    pub net: i64,
    pub timestamp_ms: i64,
    pub breakdown: Vec<BetSettlement>,
}

/// Ring of resolved rounds, newest first, oldest evicted past capacity.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<RoundHistoryEntry>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn push(&mut self, entry: RoundHistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &VecDeque<RoundHistoryEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&RoundHistoryEntry> {
        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn restore(&mut self, entries: Vec<RoundHistoryEntry>) {
        self.entries = entries.into();
        self.entries.truncate(self.capacity);
    }
}
