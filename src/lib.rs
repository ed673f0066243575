//! Colorplay — a single-player, play-money color wagering round engine.
//!
//! Players stake coins on Green, Red or Violet before a 10-second
//! countdown expires; a deterministic seeded hash picks the winning
//! outcome and matching stakes earn profit from a configurable payout
//! table. The engine is headless: it exposes synchronous commands, emits
//! events to observers, and leaves rendering, audio and durable storage
//! to external collaborators.
//!
//! Quick tour:
//! - [`engine::RoundEngine`] — the lifecycle state machine and command
//!   surface.
//! - [`ledger::Ledger`] — balance plus bounded transaction log.
//! - [`bets::BetBook`] — open bets and derived per-outcome pools.
//! - [`outcome`] — the deterministic `(seed, round_id) -> Outcome`
//!   function and fairness digest.
//! - [`history::HistoryLog`] — bounded log of resolved rounds.
//! - [`persistence`] — snapshot type and the `SnapshotStore` boundary.

pub mod bets;
pub mod config;
pub mod engine;
pub mod errors;
pub mod history;
pub mod ledger;
pub mod outcome;
pub mod persistence;

pub use bets::{Bet, BetBook, Pools};
pub use config::{ConfigError, EngineConfig, PayoutMode, PayoutTable};
pub use engine::{EngineObserver, RoundEngine, RoundState};
pub use errors::{EngineError, EngineResult};
pub use history::{BetSettlement, HistoryLog, RoundHistoryEntry};
pub use ledger::{Ledger, Transaction, TransactionKind};
pub use outcome::Outcome;
pub use persistence::{JsonFileStore, Snapshot, SnapshotStore};
