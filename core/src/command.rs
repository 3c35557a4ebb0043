use crate::{
    casino::{CrimeKind, RouletteChoice},
    types::UserId,
};
use serde::{Deserialize, Serialize};

/// All player-issued commands.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Profile ───────────────────────────────────
    Start,
    Stats,
    Balance,

    // ── Bank ──────────────────────────────────────
    Deposit { amount: i64 },
    Withdraw { amount: i64 },

    // ── Jobs ──────────────────────────────────────
    /// Show current offers, issuing fresh ones if none are valid.
    Jobs,
    /// Claim offer `number` (1-based).
    Job { number: usize },

    // ── Shop ──────────────────────────────────────
    ShopList,
    ShopBuy { key: String },

    // ── Casino and crime ──────────────────────────
    Roulette { bet: i64, choice: RouletteChoice },
    Blackjack { bet: i64 },
    Crime { kind: CrimeKind },
    Rob { target: UserId },

    // ── Lottery ───────────────────────────────────
    LotteryBuy,
    LotteryDraw,
}

impl PlayerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start          => "start",
            Self::Stats          => "stats",
            Self::Balance        => "balance",
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::Jobs           => "jobs",
            Self::Job { .. }     => "job",
            Self::ShopList       => "shop_list",
            Self::ShopBuy { .. } => "shop_buy",
            Self::Roulette { .. } => "roulette",
            Self::Blackjack { .. } => "blackjack",
            Self::Crime { .. }   => "crime",
            Self::Rob { .. }     => "rob",
            Self::LotteryBuy     => "lottery_buy",
            Self::LotteryDraw    => "lottery_draw",
        }
    }
}

/// A player command tagged with the issuing user and a unique id for log
/// correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub command_id: String,
    pub user_id:    UserId,
    pub command:    PlayerCommand,
}

impl QueuedCommand {
    pub fn new(user_id: impl Into<UserId>, command: PlayerCommand) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            user_id:    user_id.into(),
            command,
        }
    }
}
