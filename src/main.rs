//! Interactive terminal front end for the colorplay round engine.
//!
//! Drives the engine with a once-per-second clock and stdin commands.
//! Every command and tick goes through this single task, which preserves
//! the engine's serialized-command guarantee, and the snapshot is saved
//! best-effort after each mutation.

use clap::Parser;
use colorplay::persistence::save_best_effort;
use colorplay::{
    EngineConfig, EngineObserver, JsonFileStore, Outcome, RoundEngine, RoundHistoryEntry,
    RoundState, SnapshotStore,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "colorplay", about = "Play-money color wagering game")]
struct Args {
    /// Snapshot file persisted between sessions
    #[arg(long, default_value = "colorplay.json")]
    data_file: PathBuf,

    /// Optional TOML file overriding the engine defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

struct TerminalObserver;

impl EngineObserver for TerminalObserver {
    fn on_tick(&mut self, countdown: u32) {
        println!("  {:02}s", countdown);
    }

    fn on_round_resolved(&mut self, entry: &RoundHistoryEntry) {
        let sign = if entry.net > 0 { "+" } else { "" };
        println!(
            "round {} resolved: winner {}, net {}{}",
            entry.round_id, entry.winner, sign, entry.net
        );
    }

    fn on_balance_changed(&mut self, balance: u64) {
        println!("  balance: {}", balance);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;

    let store = JsonFileStore::new(&args.data_file);
    let mut engine = RoundEngine::new(config);
    if let Some(snapshot) = store.load()? {
        engine.restore(snapshot);
        info!(path = %store.path().display(), "snapshot loaded");
    }
    engine.subscribe(Box::new(TerminalObserver));

    println!("colorplay — type 'help' for commands");
    print_status(&engine);

    let mut clock = tokio::time::interval(Duration::from_secs(1));
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = clock.tick() => {
                if engine.state() == RoundState::Running {
                    let _ = engine.tick();
                    save_best_effort(&store, &engine.snapshot());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&mut engine, line.trim()) {
                    break;
                }
                save_best_effort(&store, &engine.snapshot());
            }
        }
    }

    store.save(&engine.snapshot())?;
    Ok(())
}

/// Apply one command line; returns false when the session should end.
fn handle_command(engine: &mut RoundEngine, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let result = match parts.next() {
        None => Ok(()),
        Some("bet") => match (parts.next(), parts.next()) {
            (Some(outcome), Some(amount)) => {
                match (outcome.parse::<Outcome>(), amount.parse::<u64>()) {
                    (Ok(outcome), Ok(amount)) => engine.place_bet(outcome, amount),
                    (Err(e), _) => {
                        println!("{}", e);
                        Ok(())
                    }
                    (_, Err(_)) => {
                        println!("amount must be a number");
                        Ok(())
                    }
                }
            }
            _ => {
                println!("usage: bet <green|red|violet> <amount>");
                Ok(())
            }
        },
        Some("remove") => match parts.next().and_then(|s| s.parse::<usize>().ok()) {
            Some(index) => engine.remove_bet(index),
            None => {
                println!("usage: remove <index>");
                Ok(())
            }
        },
        Some("start") => engine.start(),
        Some("pause") => engine.pause(),
        Some("refill") => {
            let amount = parts
                .next()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(engine.config().refill_amount);
            engine.refill(amount)
        }
        Some("seed") => engine.new_seed(),
        Some("reset") => engine.reset(),
        Some("sound") => {
            engine.set_sound(parts.next() != Some("off"));
            Ok(())
        }
        Some("vibrate") => {
            engine.set_vibrate(parts.next() != Some("off"));
            Ok(())
        }
        Some("status") => {
            print_status(engine);
            Ok(())
        }
        Some("history") => {
            print_history(engine);
            Ok(())
        }
        Some("txs") => {
            print_transactions(engine);
            Ok(())
        }
        Some("help") => {
            print_help();
            Ok(())
        }
        Some("quit") | Some("exit") => return false,
        Some(other) => {
            println!("unknown command: {} (try 'help')", other);
            Ok(())
        }
    };
    if let Err(err) = result {
        println!("error: {}", err);
    }
    true
}

fn print_status(engine: &RoundEngine) {
    let pools = engine.pools();
    println!("period {}  seed {}", engine.round_id(), engine.seed_digest());
    println!(
        "balance {}  staked {}  countdown {:02}s ({})",
        engine.balance(),
        engine.total_staked(),
        engine.countdown(),
        match engine.state() {
            RoundState::Running => "running",
            _ => "idle",
        }
    );
    println!(
        "pools: green {}  red {}  violet {}",
        pools.green, pools.red, pools.violet
    );
    for (index, bet) in engine.bets().iter().enumerate() {
        println!("  [{}] {} on {}", index, bet.amount, bet.outcome);
    }
}

fn print_history(engine: &RoundEngine) {
    if engine.history().is_empty() {
        println!("no rounds yet");
        return;
    }
    for entry in engine.history() {
        let sign = if entry.net > 0 { "+" } else { "" };
        println!(
            "round {}: winner {}, net {}{}",
            entry.round_id, entry.winner, sign, entry.net
        );
    }
}

fn print_transactions(engine: &RoundEngine) {
    if engine.transactions().is_empty() {
        println!("no transactions yet");
        return;
    }
    for tx in engine.transactions() {
        let outcome = tx
            .outcome
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:?} {} ({})  bal {}",
            tx.kind, tx.amount, outcome, tx.balance_after
        );
    }
}

fn print_help() {
    println!("commands:");
    println!("  bet <green|red|violet> <amount>   stake coins on an outcome");
    println!("  remove <index>                    withdraw an open bet");
    println!("  start | pause                     control the countdown");
    println!("  refill [amount]                   add coins to the wallet");
    println!("  seed                              rotate the outcome seed");
    println!("  reset                             restore initial balance, clear logs");
    println!("  sound on|off / vibrate on|off     preference flags");
    println!("  status | history | txs            inspect state");
    println!("  quit                              save and exit");
}
