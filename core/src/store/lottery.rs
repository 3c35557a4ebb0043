use super::{move_aside, write_json_atomic};
use crate::{
    error::EconResult,
    lottery::LotteryState,
    types::{Coins, Timestamp},
};
use std::fs;
use std::io;
use std::path::PathBuf;

pub const LOTTERY_FILE: &str = "lottery.json";

pub struct LotteryStore {
    pub state: LotteryState,
    path:      Option<PathBuf>,
}

impl LotteryStore {
    /// Load the lottery file. Like the profile document, a corrupt file is
    /// moved aside and the lottery restarts from the seed jackpot.
    pub fn open(path: impl Into<PathBuf>, seed_jackpot: Coins, now: Timestamp) -> EconResult<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<LotteryState>(&text) {
                Ok(state) => state,
                Err(e) => {
                    let backup = move_aside(&path, now)?;
                    log::error!(
                        "lottery: {} is corrupt ({e}); moved to {} and reset",
                        path.display(),
                        backup.display()
                    );
                    LotteryState::new(seed_jackpot)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => LotteryState::new(seed_jackpot),
            Err(e) => return Err(e.into()),
        };
        let store = Self { state, path: Some(path) };
        store.save()?;
        Ok(store)
    }

    pub fn in_memory(seed_jackpot: Coins) -> Self {
        Self {
            state: LotteryState::new(seed_jackpot),
            path: None,
        }
    }

    pub fn save(&self) -> EconResult<()> {
        match &self.path {
            Some(path) => write_json_atomic(path, &self.state),
            None => Ok(()),
        }
    }
}
