//! Ledger events: the record of every balance or state change.
//!
//! RULE: Every committed mutation reports what it did as events.
//! The Economy service logs each one; callers may render them.

use crate::{
    effect::EffectKind,
    types::{Coins, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    // ── Accrual ────────────────────────────────────
    JobIncomePaid {
        hours:         i64,
        boosted_hours: i64,
        amount:        Coins,
    },
    InterestCompounded {
        hours:  i64,
        before: Coins,
        after:  Coins,
    },

    // ── Effects and cooldowns ──────────────────────
    EffectGranted {
        kind:       EffectKind,
        percent:    Option<u32>,
        #[serde(with = "crate::clock::iso")]
        expires_at: Timestamp,
    },
    EffectExpired {
        kind: EffectKind,
    },
    CooldownCleared,

    // ── Profile and bank ───────────────────────────
    ProfileCreated {
        wallet: Coins,
    },
    Deposited {
        amount: Coins,
    },
    Withdrew {
        amount: Coins,
    },

    // ── Jobs ───────────────────────────────────────
    OffersIssued {
        offers:     Vec<String>,
        #[serde(with = "crate::clock::iso")]
        expires_at: Timestamp,
    },
    JobClaimed {
        job:    String,
        income: Coins,
    },

    // ── Shop ───────────────────────────────────────
    ItemPurchased {
        key:   String,
        name:  String,
        price: Coins,
    },

    // ── Casino and crime ───────────────────────────
    BetSettled {
        game:  String,
        bet:   Coins,
        /// Wallet change: +bet on a win, -bet on a loss, 0 on a push.
        delta: Coins,
    },
    CrimeCommitted {
        crime:   String,
        success: bool,
        delta:   Coins,
    },
    RobAttempted {
        target:  UserId,
        success: bool,
        amount:  Coins,
    },

    // ── Lottery ────────────────────────────────────
    LotteryTicketBought {
        price:   Coins,
        jackpot: Coins,
    },
    LotteryDrawn {
        winner:  UserId,
        jackpot: Coins,
        tickets: usize,
    },
}

impl LedgerEvent {
    /// Stable string name for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::JobIncomePaid { .. }       => "job_income_paid",
            Self::InterestCompounded { .. }  => "interest_compounded",
            Self::EffectGranted { .. }       => "effect_granted",
            Self::EffectExpired { .. }       => "effect_expired",
            Self::CooldownCleared            => "cooldown_cleared",
            Self::ProfileCreated { .. }      => "profile_created",
            Self::Deposited { .. }           => "deposited",
            Self::Withdrew { .. }            => "withdrew",
            Self::OffersIssued { .. }        => "offers_issued",
            Self::JobClaimed { .. }          => "job_claimed",
            Self::ItemPurchased { .. }       => "item_purchased",
            Self::BetSettled { .. }          => "bet_settled",
            Self::CrimeCommitted { .. }      => "crime_committed",
            Self::RobAttempted { .. }        => "rob_attempted",
            Self::LotteryTicketBought { .. } => "lottery_ticket_bought",
            Self::LotteryDrawn { .. }        => "lottery_drawn",
        }
    }
}
