use thiserror::Error;

use crate::types::Coins;

#[derive(Error, Debug)]
pub enum EconError {
    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Coins, available: Coins },

    #[error("Amount must be a positive number (got {amount})")]
    InvalidAmount { amount: Coins },

    #[error("Invalid choice '{choice}'")]
    InvalidChoice { choice: String },

    #[error("No valid job offers")]
    NoValidOffers,

    #[error("Invalid job number {index}: choose 1..={len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("Job '{name}' no longer exists")]
    JobRemoved { name: String },

    #[error("Invalid item key '{key}'")]
    InvalidItemKey { key: String },

    #[error("Catalog item '{key}' is misconfigured: {reason}")]
    InvalidCatalog { key: String, reason: String },

    #[error("Cooldown active: {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: i64 },

    #[error("Target is protected by a shield")]
    TargetShielded,

    #[error("You cannot target yourself")]
    SelfTargetNotAllowed,

    #[error("No profile for '{target}'")]
    UnknownTarget { target: String },

    #[error("No lottery tickets sold")]
    NoLotteryTickets,

    #[error("Lottery draw not due for {remaining_secs}s")]
    LotteryNotDue { remaining_secs: i64 },

    #[error("Arithmetic overflow while {context}")]
    Overflow { context: &'static str },

    #[error("Corrupt persisted state in {path}: {reason}")]
    CorruptPersistedState { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EconResult<T> = Result<T, EconError>;
