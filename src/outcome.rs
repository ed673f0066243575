//! Deterministic outcome selection.
//!
//! The winning outcome of a round is a pure function of `(seed, round_id)`:
//! an FNV-1a hash of the seed concatenated with the decimal round id,
//! bucketed 40/40/20 across Green/Red/Violet. The same pair always yields
//! the same outcome, so any observer holding the seed can replay and audit
//! every resolution. This is intentionally non-cryptographic; it provides
//! reproducibility, not unpredictability.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three wager categories of a round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Green,
    Red,
    Violet,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Green, Outcome::Red, Outcome::Violet];
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Green => write!(f, "green"),
            Outcome::Red => write!(f, "red"),
            Outcome::Violet => write!(f, "violet"),
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "green" | "g" => Ok(Outcome::Green),
            "red" | "r" => Ok(Outcome::Red),
            "violet" | "v" => Ok(Outcome::Violet),
            other => Err(format!("unknown outcome: {}", other)),
        }
    }
}

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over the character codes of `s`, with wrapping 32-bit multiply.
fn fnv1a(s: &str) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for c in s.chars() {
        h ^= c as u32;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn round_hash(seed: &str, round_id: u64) -> u32 {
    fnv1a(&format!("{}{}", seed, round_id))
}

/// Winning outcome for a round.
///
/// `h % 1000` maps to `[0, 1)` in thousandths; `< 0.4` is Green,
/// `< 0.8` is Red, the rest is Violet (40/40/20 split).
pub fn winning_outcome(seed: &str, round_id: u64) -> Outcome {
    match round_hash(seed, round_id) % 1000 {
        0..=399 => Outcome::Green,
        400..=799 => Outcome::Red,
        _ => Outcome::Violet,
    }
}

/// Public fairness digest for the upcoming round, shown to the player
/// before the countdown expires. Eight lowercase hex digits of the same
/// hash that drives [`winning_outcome`].
pub fn seed_digest(seed: &str, round_id: u64) -> String {
    format!("{:08x}", round_hash(seed, round_id))
}

/// Fresh opaque seed: unix milliseconds, a dash, and a short random
/// base36 suffix.
pub fn random_seed() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..10)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}
