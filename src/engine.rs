//! Round lifecycle state machine and orchestration.
//!
//! The engine is headless and synchronous: a presentation layer issues
//! commands and a once-per-second clock signal, and subscribes to events
//! through [`EngineObserver`]. Exactly one command or tick is processed
//! at a time; resolution runs to completion inside the tick that expires
//! the countdown, so no partially-resolved state is ever observable.

use crate::bets::{Bet, BetBook, Pools};
use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::history::{BetSettlement, HistoryLog, RoundHistoryEntry};
use crate::ledger::{Ledger, Transaction, TransactionKind};
use crate::outcome::{self, Outcome};
use crate::persistence::Snapshot;
use chrono::Utc;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Lifecycle states of a round.
///
/// `Resolving` exists only inside `tick()`: it is entered when the
/// countdown expires and exited before the call returns. Command methods
/// still check it so that an observer callback fired mid-resolution can
/// never re-enter mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    Running,
    Resolving,
}

/// Events emitted to the presentation layer. All methods default to
/// no-ops; implement only what the front end cares about.
pub trait EngineObserver {
    fn on_tick(&mut self, _countdown: u32) {}
    fn on_round_resolved(&mut self, _entry: &RoundHistoryEntry) {}
    fn on_balance_changed(&mut self, _balance: u64) {}
}

/// The round engine: state machine plus bet book, ledger and history.
pub struct RoundEngine {
    config: EngineConfig,
    state: RoundState,
    countdown: u32,
    seed: String,
    round_id: u64,
    ledger: Ledger,
    bets: BetBook,
    history: HistoryLog,
    sound_on: bool,
    vibrate_on: bool,
    observers: Vec<Box<dyn EngineObserver>>,
}

impl RoundEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_seed(config, outcome::random_seed())
    }

    /// Build an engine with an explicit seed, for deterministic replays.
    pub fn with_seed(config: EngineConfig, seed: impl Into<String>) -> Self {
        let ledger = Ledger::new(config.initial_balance, config.transaction_limit);
        let history = HistoryLog::new(config.history_limit);
        Self {
            countdown: config.round_seconds,
            round_id: config.initial_round_id,
            state: RoundState::Idle,
            seed: seed.into(),
            ledger,
            bets: BetBook::new(),
            history,
            sound_on: true,
            vibrate_on: true,
            observers: Vec::new(),
            config,
        }
    }

    /// Register an observer for engine events.
    pub fn subscribe(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    // --- Commands -------------------------------------------------------

    /// Stake `amount` on `outcome`. Debits the balance immediately and
    /// logs a `Bet` transaction.
    pub fn place_bet(&mut self, outcome: Outcome, amount: u64) -> EngineResult<()> {
        if self.state == RoundState::Resolving {
            return Ok(());
        }
        if amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        self.ledger
            .debit(amount, TransactionKind::Bet, Some(outcome))?;
        self.bets.push(Bet { outcome, amount });
        debug!(%outcome, amount, balance = self.ledger.balance(), "bet placed");
        self.emit_balance();
        Ok(())
    }

    /// Withdraw the bet at `index`, crediting the full stake back as a
    /// `Refund` transaction.
    pub fn remove_bet(&mut self, index: usize) -> EngineResult<()> {
        if self.state == RoundState::Resolving {
            return Ok(());
        }
        let bet = self
            .bets
            .remove(index)
            .ok_or(EngineError::NotFound { index })?;
        self.ledger
            .credit(bet.amount, TransactionKind::Refund, Some(bet.outcome));
        debug!(outcome = %bet.outcome, amount = bet.amount, "bet refunded");
        self.emit_balance();
        Ok(())
    }

    /// Start the countdown. Rejected when the wallet is empty; a no-op
    /// when a round is already running.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.state != RoundState::Idle {
            return Ok(());
        }
        if self.ledger.balance() == 0 {
            return Err(EngineError::InsufficientBalance);
        }
        self.state = RoundState::Running;
        info!(round_id = self.round_id, countdown = self.countdown, "round started");
        Ok(())
    }

    /// Halt the countdown. The countdown value and open bets are
    /// retained; nothing is resolved.
    pub fn pause(&mut self) -> EngineResult<()> {
        if self.state == RoundState::Running {
            self.state = RoundState::Idle;
            debug!(countdown = self.countdown, "round paused");
        }
        Ok(())
    }

    /// Credit `amount` to the wallet as a `Refill` transaction.
    pub fn refill(&mut self, amount: u64) -> EngineResult<()> {
        if self.state == RoundState::Resolving {
            return Ok(());
        }
        self.ledger.credit(amount, TransactionKind::Refill, None);
        info!(amount, balance = self.ledger.balance(), "wallet refilled");
        self.emit_balance();
        Ok(())
    }

    /// Replace the seed with a fresh random one.
    pub fn new_seed(&mut self) -> EngineResult<()> {
        if self.state == RoundState::Resolving {
            return Ok(());
        }
        self.seed = outcome::random_seed();
        debug!(digest = %self.seed_digest(), "seed rotated");
        Ok(())
    }

    /// Restore the initial balance and round id; clear bets, history and
    /// transactions. The seed is kept.
    pub fn reset(&mut self) -> EngineResult<()> {
        if self.state == RoundState::Resolving {
            return Ok(());
        }
        self.state = RoundState::Idle;
        self.countdown = self.config.round_seconds;
        self.round_id = self.config.initial_round_id;
        self.ledger.reset(self.config.initial_balance);
        self.bets.clear();
        self.history.clear();
        info!(balance = self.ledger.balance(), round_id = self.round_id, "engine reset");
        self.emit_balance();
        Ok(())
    }

    /// Advance the countdown by one unit. A no-op outside `Running`.
    /// Reaching zero triggers synchronous resolution, after which the
    /// engine is `Idle` with the countdown reset.
    pub fn tick(&mut self) -> EngineResult<()> {
        if self.state != RoundState::Running {
            return Ok(());
        }
        self.countdown = self.countdown.saturating_sub(1);
        let countdown = self.countdown;
        self.emit(|obs| obs.on_tick(countdown));
        if self.countdown == 0 {
            self.resolve_round();
        }
        Ok(())
    }

    pub fn set_sound(&mut self, on: bool) {
        self.sound_on = on;
    }

    pub fn set_vibrate(&mut self, on: bool) {
        self.vibrate_on = on;
    }

    // --- Resolution -----------------------------------------------------

    /// Resolution procedure, invoked internally at countdown expiry.
    /// Non-preemptible: outcome selection, payout, history append,
    /// bet-book clearing and round-id increment complete before any
    /// other command is accepted.
    fn resolve_round(&mut self) {
        self.state = RoundState::Resolving;
        let winner = outcome::winning_outcome(&self.seed, self.round_id);
        let bets = self.bets.take();
        let total_staked: u64 = bets.iter().map(|b| b.amount).sum();

        let mut credit_back = 0u64;
        let mut breakdown = Vec::with_capacity(bets.len());
        for bet in &bets {
            if bet.outcome == winner {
                let profit = self
                    .config
                    .payout_mode
                    .credit(bet.amount, self.config.payouts.multiplier(winner));
                credit_back += profit;
                breakdown.push(BetSettlement {
                    outcome: bet.outcome,
                    amount: bet.amount,
                    won: true,
                    profit,
                });
            } else {
                breakdown.push(BetSettlement {
                    outcome: bet.outcome,
                    amount: bet.amount,
                    won: false,
                    profit: 0,
                });
            }
        }

        if credit_back > 0 {
            self.ledger
                .credit(credit_back, TransactionKind::Payout, Some(winner));
        } else {
            // Stakes were already debited at placement; record the forfeit.
            self.ledger
                .record(TransactionKind::Loss, Some(winner), total_staked);
        }

        let entry = RoundHistoryEntry {
            round_id: self.round_id,
            winner,
            net: credit_back as i64 - total_staked as i64,
            timestamp_ms: Utc::now().timestamp_millis(),
            breakdown,
        };
        self.history.push(entry.clone());
        self.round_id += 1;
        self.countdown = self.config.round_seconds;
        self.state = RoundState::Idle;
        info!(
            round_id = entry.round_id,
            winner = %entry.winner,
            net = entry.net,
            balance = self.ledger.balance(),
            "round resolved"
        );

        if credit_back > 0 {
            self.emit_balance();
        }
        self.emit(|obs| obs.on_round_resolved(&entry));
    }

    // --- Accessors ------------------------------------------------------

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    pub fn bets(&self) -> &[Bet] {
        self.bets.bets()
    }

    pub fn pools(&self) -> Pools {
        self.bets.pools()
    }

    pub fn total_staked(&self) -> u64 {
        self.bets.total_staked()
    }

    /// Resolved rounds, newest first.
    pub fn history(&self) -> &VecDeque<RoundHistoryEntry> {
        self.history.entries()
    }

    /// Transactions, newest first.
    pub fn transactions(&self) -> &VecDeque<Transaction> {
        self.ledger.transactions()
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Fairness digest of the upcoming round.
    pub fn seed_digest(&self) -> String {
        outcome::seed_digest(&self.seed, self.round_id)
    }

    pub fn round_id(&self) -> u64 {
        self.round_id
    }

    pub fn sound_on(&self) -> bool {
        self.sound_on
    }

    pub fn vibrate_on(&self) -> bool {
        self.vibrate_on
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Persistence ----------------------------------------------------

    /// Serialize the complete persistable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            balance: self.ledger.balance(),
            round_id: self.round_id,
            open_bets: self.bets.bets().to_vec(),
            history: self.history.entries().iter().cloned().collect(),
            transactions: self.ledger.transactions().iter().cloned().collect(),
            seed: self.seed.clone(),
            sound_on: self.sound_on,
            vibrate_on: self.vibrate_on,
        }
    }

    /// Replace engine state from a snapshot. Intended to run before the
    /// first command; the engine comes back `Idle` with a full countdown.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.ledger
            .restore(snapshot.balance, snapshot.transactions);
        self.bets.restore(snapshot.open_bets);
        self.history.restore(snapshot.history);
        self.seed = snapshot.seed;
        self.round_id = snapshot.round_id;
        self.sound_on = snapshot.sound_on;
        self.vibrate_on = snapshot.vibrate_on;
        self.state = RoundState::Idle;
        self.countdown = self.config.round_seconds;
        self.emit_balance();
    }

    // --- Events ---------------------------------------------------------

    fn emit(&mut self, mut f: impl FnMut(&mut dyn EngineObserver)) {
        for observer in &mut self.observers {
            f(observer.as_mut());
        }
    }

    fn emit_balance(&mut self) {
        let balance = self.ledger.balance();
        self.emit(|obs| obs.on_balance_changed(balance));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PayoutMode;
    use std::sync::{Arc, Mutex};

    fn engine_with_seed(seed: &str) -> RoundEngine {
        RoundEngine::with_seed(EngineConfig::default(), seed)
    }

    fn run_full_round(engine: &mut RoundEngine) {
        engine.start().unwrap();
        for _ in 0..engine.config().round_seconds {
            engine.tick().unwrap();
        }
    }

    /// Seed whose outcome at round 202510040500 is the given winner
    /// (precomputed against the FNV bucketing).
    fn seed_for_winner(winner: Outcome) -> &'static str {
        match winner {
            Outcome::Green => "s0",
            Outcome::Violet => "s1",
            Outcome::Red => "s2",
        }
    }

    #[test]
    fn test_over_budget_bet_rejected_without_mutation() {
        let mut engine = engine_with_seed("seed");
        engine.reset().unwrap();
        // Drain the wallet down to 50.
        engine.place_bet(Outcome::Red, 950).unwrap();
        let err = engine.place_bet(Outcome::Green, 100).unwrap_err();
        assert_eq!(err, EngineError::InsufficientBalance);
        assert_eq!(engine.balance(), 50);
        assert_eq!(engine.bets().len(), 1);
    }

    #[test]
    fn test_zero_amount_bet_rejected() {
        let mut engine = engine_with_seed("seed");
        assert_eq!(
            engine.place_bet(Outcome::Green, 0).unwrap_err(),
            EngineError::InvalidAmount
        );
        assert!(engine.bets().is_empty());
    }

    #[test]
    fn test_remove_bet_refunds_full_amount() {
        let mut engine = engine_with_seed("seed");
        engine.place_bet(Outcome::Violet, 200).unwrap();
        assert_eq!(engine.balance(), 800);
        engine.remove_bet(0).unwrap();
        assert_eq!(engine.balance(), 1000);
        assert!(engine.bets().is_empty());
        assert_eq!(
            engine.transactions().front().unwrap().kind,
            TransactionKind::Refund
        );
    }

    #[test]
    fn test_remove_bet_invalid_index() {
        let mut engine = engine_with_seed("seed");
        assert_eq!(
            engine.remove_bet(0).unwrap_err(),
            EngineError::NotFound { index: 0 }
        );
    }

    #[test]
    fn test_start_with_empty_wallet_rejected() {
        let mut engine = engine_with_seed("seed");
        engine.place_bet(Outcome::Green, 1000).unwrap();
        assert_eq!(engine.balance(), 0);
        assert_eq!(engine.start().unwrap_err(), EngineError::InsufficientBalance);
        assert_eq!(engine.state(), RoundState::Idle);
    }

    #[test]
    fn test_tick_is_noop_when_idle() {
        let mut engine = engine_with_seed("seed");
        engine.tick().unwrap();
        assert_eq!(engine.countdown(), 10);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_pause_retains_countdown_and_bets() {
        let mut engine = engine_with_seed("seed");
        engine.place_bet(Outcome::Green, 100).unwrap();
        engine.start().unwrap();
        engine.tick().unwrap();
        engine.tick().unwrap();
        engine.pause().unwrap();
        assert_eq!(engine.state(), RoundState::Idle);
        assert_eq!(engine.countdown(), 8);
        assert_eq!(engine.bets().len(), 1);
        // Resuming picks up where the countdown left off.
        engine.start().unwrap();
        engine.tick().unwrap();
        assert_eq!(engine.countdown(), 7);
    }

    #[test]
    fn test_resolution_postconditions() {
        let mut engine = engine_with_seed("seed");
        engine.place_bet(Outcome::Green, 100).unwrap();
        let round_id = engine.round_id();
        run_full_round(&mut engine);
        assert_eq!(engine.state(), RoundState::Idle);
        assert!(engine.bets().is_empty());
        assert_eq!(engine.round_id(), round_id + 1);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.countdown(), 10);
        assert_eq!(
            engine.history().front().unwrap().winner,
            outcome::winning_outcome("seed", round_id)
        );
    }

    #[test]
    fn test_payout_example_profit_only() {
        // Spec example: bets [{Green,100},{Red,50}], winner Green.
        let mut engine = engine_with_seed(seed_for_winner(Outcome::Green));
        engine.place_bet(Outcome::Green, 100).unwrap();
        engine.place_bet(Outcome::Red, 50).unwrap();
        assert_eq!(engine.balance(), 850);
        run_full_round(&mut engine);

        // Profit 100 * (2.0 - 1) = 100 credited; Red stake forfeited.
        assert_eq!(engine.balance(), 950);
        let entry = engine.history().front().unwrap();
        assert_eq!(entry.winner, Outcome::Green);
        assert_eq!(entry.net, -50);
        assert_eq!(entry.breakdown.len(), 2);
        assert!(entry.breakdown[0].won);
        assert_eq!(entry.breakdown[0].profit, 100);
        assert!(!entry.breakdown[1].won);
        assert_eq!(entry.breakdown[1].profit, 0);
        assert_eq!(
            engine.transactions().front().unwrap().kind,
            TransactionKind::Payout
        );
    }

    #[test]
    fn test_violet_pays_four_to_one() {
        let mut engine = engine_with_seed(seed_for_winner(Outcome::Violet));
        engine.place_bet(Outcome::Violet, 100).unwrap();
        run_full_round(&mut engine);
        // 100 * (4.0 - 1) = 300 profit on a 900 balance.
        assert_eq!(engine.balance(), 1200);
        assert_eq!(engine.history().front().unwrap().net, 200);
    }

    #[test]
    fn test_all_losing_round_logs_loss_without_credit() {
        let mut engine = engine_with_seed(seed_for_winner(Outcome::Red));
        engine.place_bet(Outcome::Green, 100).unwrap();
        engine.place_bet(Outcome::Violet, 50).unwrap();
        run_full_round(&mut engine);
        assert_eq!(engine.balance(), 850);
        let tx = engine.transactions().front().unwrap();
        assert_eq!(tx.kind, TransactionKind::Loss);
        assert_eq!(tx.amount, 150);
        assert_eq!(tx.balance_after, 850);
        assert_eq!(engine.history().front().unwrap().net, -150);
    }

    #[test]
    fn test_stake_plus_profit_mode() {
        let mut config = EngineConfig::default();
        config.payout_mode = PayoutMode::StakePlusProfit;
        let mut engine = RoundEngine::with_seed(config, seed_for_winner(Outcome::Green));
        engine.place_bet(Outcome::Green, 100).unwrap();
        run_full_round(&mut engine);
        // Stake returned with the profit: 900 + 100 * 2.0.
        assert_eq!(engine.balance(), 1100);
    }

    #[test]
    fn test_pools_track_total_staked_through_commands() {
        let mut engine = engine_with_seed("seed");
        engine.place_bet(Outcome::Green, 100).unwrap();
        engine.place_bet(Outcome::Red, 50).unwrap();
        engine.place_bet(Outcome::Green, 25).unwrap();
        assert_eq!(engine.pools().total(), engine.total_staked());
        engine.remove_bet(1).unwrap();
        assert_eq!(engine.pools().total(), engine.total_staked());
        assert_eq!(engine.pools().green, 125);
        assert_eq!(engine.pools().red, 0);
    }

    #[test]
    fn test_refill_credits_and_logs() {
        let mut engine = engine_with_seed("seed");
        engine.refill(1000).unwrap();
        assert_eq!(engine.balance(), 2000);
        assert_eq!(
            engine.transactions().front().unwrap().kind,
            TransactionKind::Refill
        );
    }

    #[test]
    fn test_new_seed_changes_digest_keeps_round() {
        let mut engine = engine_with_seed("seed");
        let before = engine.seed_digest();
        let round_id = engine.round_id();
        engine.new_seed().unwrap();
        assert_ne!(engine.seed(), "seed");
        assert_ne!(engine.seed_digest(), before);
        assert_eq!(engine.round_id(), round_id);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut engine = engine_with_seed("seed");
        engine.place_bet(Outcome::Green, 100).unwrap();
        run_full_round(&mut engine);
        engine.refill(500).unwrap();
        engine.reset().unwrap();
        assert_eq!(engine.balance(), 1000);
        assert_eq!(engine.round_id(), engine.config().initial_round_id);
        assert!(engine.bets().is_empty());
        assert!(engine.history().is_empty());
        assert!(engine.transactions().is_empty());
        assert_eq!(engine.seed(), "seed");
    }

    #[test]
    fn test_history_capacity_after_many_rounds() {
        let mut engine = engine_with_seed("seed");
        let initial = engine.round_id();
        for _ in 0..51 {
            run_full_round(&mut engine);
        }
        assert_eq!(engine.history().len(), 50);
        // Earliest round evicted first: the oldest surviving entry is
        // the second round ever resolved.
        assert_eq!(engine.history().back().unwrap().round_id, initial + 1);
        assert_eq!(engine.history().front().unwrap().round_id, initial + 50);
    }

    #[derive(Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl EngineObserver for Recorder {
        fn on_tick(&mut self, countdown: u32) {
            self.events.lock().unwrap().push(format!("tick:{}", countdown));
        }
        fn on_round_resolved(&mut self, entry: &RoundHistoryEntry) {
            self.events
                .lock()
                .unwrap()
                .push(format!("resolved:{}", entry.round_id));
        }
        fn on_balance_changed(&mut self, balance: u64) {
            self.events
                .lock()
                .unwrap()
                .push(format!("balance:{}", balance));
        }
    }

    #[test]
    fn test_observer_event_stream() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut engine = engine_with_seed(seed_for_winner(Outcome::Green));
        engine.subscribe(Box::new(Recorder {
            events: events.clone(),
        }));
        let round_id = engine.round_id();
        engine.place_bet(Outcome::Green, 100).unwrap();
        run_full_round(&mut engine);

        let events = events.lock().unwrap();
        assert_eq!(events[0], "balance:900");
        assert_eq!(events[1], "tick:9");
        assert!(events.contains(&"tick:0".to_string()));
        // Payout lands before the resolution event.
        let balance_pos = events.iter().position(|e| e == "balance:1000").unwrap();
        let resolved_pos = events
            .iter()
            .position(|e| *e == format!("resolved:{}", round_id))
            .unwrap();
        assert!(balance_pos < resolved_pos);
    }

    #[test]
    fn test_snapshot_restore_round_trips() {
        let mut engine = engine_with_seed("seed");
        engine.place_bet(Outcome::Green, 100).unwrap();
        run_full_round(&mut engine);
        engine.place_bet(Outcome::Red, 50).unwrap();
        engine.set_sound(false);
        let snapshot = engine.snapshot();

        let mut restored = RoundEngine::new(EngineConfig::default());
        restored.restore(snapshot.clone());
        assert_eq!(restored.balance(), engine.balance());
        assert_eq!(restored.round_id(), engine.round_id());
        assert_eq!(restored.bets(), engine.bets());
        assert_eq!(restored.seed(), engine.seed());
        assert!(!restored.sound_on());
        assert_eq!(restored.state(), RoundState::Idle);
        assert_eq!(restored.snapshot(), snapshot);
    }
}
