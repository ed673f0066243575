//! Engine configuration with validation and defaults.

use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tunable parameters of the round engine.
///
/// Defaults mirror the reference game: 10-second rounds, 1000 starting
/// coins, 2x/2x/4x payouts in profit-only mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Countdown length of a round, in clock ticks.
    pub round_seconds: u32,
    /// Balance granted on first run and on `reset()`.
    pub initial_balance: u64,
    /// Default amount credited by the refill command.
    pub refill_amount: u64,
    /// First round id; subsequent rounds increment by one.
    pub initial_round_id: u64,
    /// Resolved-round log capacity.
    pub history_limit: usize,
    /// Transaction log capacity.
    pub transaction_limit: usize,
    /// Chip denominations offered by the presentation layer.
    pub chip_values: Vec<u64>,
    pub payouts: PayoutTable,
    pub payout_mode: PayoutMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            round_seconds: 10,
            initial_balance: 1000,
            refill_amount: 1000,
            initial_round_id: 202510040500,
            history_limit: 50,
            transaction_limit: 300,
            chip_values: vec![10, 50, 100, 500, 1000],
            payouts: PayoutTable::default(),
            payout_mode: PayoutMode::ProfitOnly,
        }
    }
}

/// Payout multiplier per outcome.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PayoutTable {
    pub green: f64,
    pub red: f64,
    pub violet: f64,
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self {
            green: 2.0,
            red: 2.0,
            violet: 4.0,
        }
    }
}

impl PayoutTable {
    pub fn multiplier(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Green => self.green,
            Outcome::Red => self.red,
            Outcome::Violet => self.violet,
        }
    }
}

/// How a winning bet is credited.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMode {
    /// Credit net profit only; the stake debited at placement stays spent.
    ProfitOnly,
    /// Credit the stake back together with the profit.
    StakePlusProfit,
}

impl PayoutMode {
    /// Amount credited for a winning bet of `amount` at `multiplier`.
    pub fn credit(self, amount: u64, multiplier: f64) -> u64 {
        let factor = match self {
            PayoutMode::ProfitOnly => multiplier - 1.0,
            PayoutMode::StakePlusProfit => multiplier,
        };
        (amount as f64 * factor).round() as u64
    }
}

/// Errors loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

impl EngineConfig {
    /// Load a configuration from a TOML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for logical consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_seconds == 0 {
            return Err(ConfigError::Invalid("round_seconds must be > 0".into()));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("history_limit must be > 0".into()));
        }
        if self.transaction_limit == 0 {
            return Err(ConfigError::Invalid(
                "transaction_limit must be > 0".into(),
            ));
        }
        if self.refill_amount == 0 {
            return Err(ConfigError::Invalid("refill_amount must be > 0".into()));
        }
        if self.chip_values.is_empty() || self.chip_values.iter().any(|&c| c == 0) {
            return Err(ConfigError::Invalid(
                "chip_values must be non-empty and positive".into(),
            ));
        }
        for outcome in Outcome::ALL {
            let m = self.payouts.multiplier(outcome);
            if !m.is_finite() || m < 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "payout multiplier for {} must be >= 1.0",
                    outcome
                )));
            }
        }
        Ok(())
    }
}
