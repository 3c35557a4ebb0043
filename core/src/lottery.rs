//! Shared lottery: tickets feed one jackpot; a draw every
//! `draw_interval_hours` pays the whole pot to one ticket holder.

use crate::{
    clock::checked_after,
    error::{EconError, EconResult},
    event::LedgerEvent,
    profile::Profile,
    rng::StreamRng,
    types::{Coins, Timestamp, UserId},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryTicket {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryState {
    pub jackpot: Coins,
    pub tickets: Vec<LotteryTicket>,
    #[serde(default, with = "crate::clock::iso_opt")]
    pub last_draw: Option<Timestamp>,
}

/// Result of a draw. The caller credits `winner` with `jackpot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawResult {
    pub winner:  UserId,
    pub jackpot: Coins,
    pub tickets: usize,
}

impl LotteryState {
    pub fn new(seed_jackpot: Coins) -> Self {
        Self {
            jackpot: seed_jackpot,
            tickets: Vec::new(),
            last_draw: None,
        }
    }

    /// Start the draw schedule if it has never run. Returns true if the
    /// state changed.
    pub fn ensure_schedule(&mut self, now: Timestamp) -> bool {
        if self.last_draw.is_some() {
            return false;
        }
        self.last_draw = Some(now);
        true
    }

    pub fn next_draw(&self, interval: Duration) -> Option<Timestamp> {
        self.last_draw.and_then(|t| t.checked_add_signed(interval))
    }

    /// Fail with LotteryNotDue unless a draw may run at `now`.
    pub fn check_due(&self, now: Timestamp, interval: Duration) -> EconResult<()> {
        let Some(last) = self.last_draw else {
            return Ok(());
        };
        let due = checked_after(last, interval, "scheduling the lottery draw")?;
        if now < due {
            return Err(EconError::LotteryNotDue {
                remaining_secs: (due - now).num_seconds().max(1),
            });
        }
        Ok(())
    }

    pub fn buy_ticket(
        &mut self,
        buyer_id: &str,
        buyer: &mut Profile,
        price: Coins,
    ) -> EconResult<LedgerEvent> {
        let jackpot = self
            .jackpot
            .checked_add(price)
            .ok_or(EconError::Overflow { context: "growing the jackpot" })?;
        buyer.debit_wallet(price)?;
        self.jackpot = jackpot;
        self.tickets.push(LotteryTicket { user_id: buyer_id.to_string() });
        Ok(LedgerEvent::LotteryTicketBought { price, jackpot })
    }

    /// Pick one ticket uniformly and reset the pot. Each ticket is one
    /// chance, so holders of several tickets win proportionally more often.
    pub fn draw(
        &mut self,
        now: Timestamp,
        seed_jackpot: Coins,
        rng: &mut StreamRng,
    ) -> EconResult<DrawResult> {
        if self.tickets.is_empty() {
            return Err(EconError::NoLotteryTickets);
        }
        let winner = self.tickets[rng.below(self.tickets.len())].user_id.clone();
        let result = DrawResult {
            winner,
            jackpot: self.jackpot,
            tickets: self.tickets.len(),
        };
        self.jackpot = seed_jackpot;
        self.tickets.clear();
        self.last_draw = Some(now);
        Ok(result)
    }
}
