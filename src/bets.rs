//! Open bets for the current round and their derived pools.

use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};

/// A single stake on one outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bet {
    pub outcome: Outcome,
    pub amount: u64,
}

/// Per-outcome sums of the open bets. Never stored; always derived.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pools {
    pub green: u64,
    pub red: u64,
    pub violet: u64,
}

impl Pools {
    pub fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Green => self.green,
            Outcome::Red => self.red,
            Outcome::Violet => self.violet,
        }
    }

    pub fn total(&self) -> u64 {
        self.green + self.red + self.violet
    }
}

/// The set of open bets for the round in progress.
#[derive(Debug, Clone, Default)]
pub struct BetBook {
    bets: Vec<Bet>,
}

impl BetBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bet: Bet) {
        self.bets.push(bet);
    }

    /// Remove and return the bet at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<Bet> {
        if index < self.bets.len() {
            Some(self.bets.remove(index))
        } else {
            None
        }
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// Recompute the per-outcome pools from the open bets.
    pub fn pools(&self) -> Pools {
        let mut pools = Pools::default();
        for bet in &self.bets {
            match bet.outcome {
                Outcome::Green => pools.green += bet.amount,
                Outcome::Red => pools.red += bet.amount,
                Outcome::Violet => pools.violet += bet.amount,
            }
        }
        pools
    }

    pub fn total_staked(&self) -> u64 {
        self.bets.iter().map(|b| b.amount).sum()
    }

    pub fn clear(&mut self) {
        self.bets.clear();
    }

    /// Take all open bets, leaving the book empty (used by resolution).
    pub fn take(&mut self) -> Vec<Bet> {
        std::mem::take(&mut self.bets)
    }

    pub fn restore(&mut self, bets: Vec<Bet>) {
        self.bets = bets;
    }
}
