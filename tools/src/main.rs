//! econ-runner: headless host for the casino economy.
//!
//! Usage:
//!   econ-runner --data-dir ./data --seed 12345 --sweep-secs 60
//!
//! Reads one JSON request per stdin line and writes one JSON reply per
//! stdout line:
//!   {"type":"command","user_id":"42","command":{"cmd":"deposit","amount":200}}
//!   {"type":"sweep"}
//!   {"type":"quit"}

use anyhow::Result;
use casino_core::{
    clock::SystemClock,
    command::{PlayerCommand, QueuedCommand},
    config::EconomyConfig,
    engine::{Economy, SweepReport},
};
use serde_json::json;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    Command {
        user_id: String,
        command: PlayerCommand,
    },
    Sweep,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir: PathBuf = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| PathBuf::from(&w[1]))
        .unwrap_or_else(|| PathBuf::from("./data"));
    let seed = parse_arg(&args, "--seed", seed_from_time());

    let config = EconomyConfig::load(&data_dir)?;
    let sweep_secs = parse_arg(&args, "--sweep-secs", config.accrual.sweep_interval_secs).max(1);

    let economy = Arc::new(Economy::open(&data_dir, config, seed, Arc::new(SystemClock))?);
    log::info!("econ-runner: data_dir={} seed={seed} sweep={sweep_secs}s", data_dir.display());

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let sweeper = {
        let economy = Arc::clone(&economy);
        thread::spawn(move || loop {
            match stop_rx.recv_timeout(Duration::from_secs(sweep_secs)) {
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(e) = economy.sweep() {
                        log::error!("background sweep failed: {e}");
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })
    };

    let result = run_ipc_loop(&economy);

    // Dropping the sender would also stop the thread; send explicitly so
    // the join below never waits out a full interval.
    let _ = stop_tx.send(());
    if sweeper.join().is_err() {
        log::error!("sweep thread panicked");
    }
    result
}

fn run_ipc_loop(economy: &Economy) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                writeln!(stdout, "{}", json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match request {
            IpcRequest::Quit => break,
            IpcRequest::Command { user_id, command } => {
                match economy.submit(QueuedCommand::new(user_id, command)) {
                    Ok(reply) => json!({ "ok": reply }),
                    Err(e) => json!({ "error": e.to_string() }),
                }
            }
            IpcRequest::Sweep => match economy.sweep() {
                Ok(report) => json!({ "ok": sweep_summary(&report) }),
                Err(e) => json!({ "error": e.to_string() }),
            },
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn sweep_summary(report: &SweepReport) -> serde_json::Value {
    json!({
        "profiles": report.profiles,
        "updated":  report.updated,
        "events":   report.events,
        "failed":   report.failed.iter().map(|(id, err)| json!({ "user_id": id, "error": err })).collect::<Vec<_>>(),
        "lottery":  report.lottery.as_ref().map(|d| json!({
            "winner":  d.winner,
            "jackpot": d.jackpot,
            "tickets": d.tickets,
        })),
    })
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn seed_from_time() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
