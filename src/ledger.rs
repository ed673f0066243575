//! Balance and transaction bookkeeping.
//!
//! The ledger owns the play-money balance and an append-only transaction
//! log. A balance mutation and its log entry happen in one step, so no
//! intermediate state is observable. The log is a bounded ring: newest
//! entries sit at the front, the oldest fall off the back.

use crate::errors::{EngineError, EngineResult};
use crate::outcome::Outcome;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Classifies every ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Bet,
    Refund,
    Payout,
    Loss,
    Refill,
}

/// Immutable record of a single balance event.
///
/// `Loss` entries carry the forfeited total without changing the balance;
/// stakes were already debited at placement time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub timestamp_ms: i64,
    pub kind: TransactionKind,
    pub outcome: Option<Outcome>,
    pub amount: u64,
    pub balance_after: u64,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    balance: u64,
    transactions: VecDeque<Transaction>,
    capacity: usize,
}

impl Ledger {
    pub fn new(balance: u64, capacity: usize) -> Self {
        Self {
            balance,
            transactions: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Transactions, newest first.
    pub fn transactions(&self) -> &VecDeque<Transaction> {
        &self.transactions
    }

    /// Subtract `amount` and append the matching transaction.
    pub fn debit(
        &mut self,
        amount: u64,
        kind: TransactionKind,
        outcome: Option<Outcome>,
    ) -> EngineResult<()> {
        if amount > self.balance {
            return Err(EngineError::InsufficientBalance);
        }
        self.balance -= amount;
        self.append(kind, outcome, amount);
        Ok(())
    }

    /// Add `amount` and append the matching transaction.
    pub fn credit(&mut self, amount: u64, kind: TransactionKind, outcome: Option<Outcome>) {
        self.balance += amount;
        self.append(kind, outcome, amount);
    }

    /// Append a transaction without touching the balance.
    pub fn record(&mut self, kind: TransactionKind, outcome: Option<Outcome>, amount: u64) {
        self.append(kind, outcome, amount);
    }

    fn append(&mut self, kind: TransactionKind, outcome: Option<Outcome>, amount: u64) {
        self.transactions.push_front(Transaction {
            timestamp_ms: Utc::now().timestamp_millis(),
            kind,
            outcome,
            amount,
            balance_after: self.balance,
        });
        self.transactions.truncate(self.capacity);
    }

    /// Restore the balance and clear the log.
    pub fn reset(&mut self, balance: u64) {
        self.balance = balance;
        self.transactions.clear();
    }

    /// Replace ledger state from a snapshot, newest transaction first.
    pub fn restore(&mut self, balance: u64, transactions: Vec<Transaction>) {
        self.balance = balance;
        self.transactions = transactions.into();
        self.transactions.truncate(self.capacity);
    }
}
