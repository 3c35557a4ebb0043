//! Accrual engine: turns elapsed wall-clock time into job income and
//! compounding bank interest.
//!
//! Design:
//!   - Only whole hours are ever paid. `last_pay` / `last_interest` move
//!     forward by exactly the hours paid, never to `now`, so the sub-hour
//!     remainder carries into the next reconciliation.
//!   - reconcile() is pure: profile + instant in, new profile + events out.
//!     Calling it again at the same instant is a no-op, so the sweep and
//!     user actions may both reconcile the same profile in any order.
//!   - Boosts are honoured per hour: the elapsed span is split at the
//!     boost's expiry, boosted hours first, base-rate hours after.
//!   - `last_interest` advances even while the bank is empty, so a later
//!     deposit never earns interest for hours it was not in the bank.

use crate::{
    clock::whole_hours_between,
    config::AccrualConfig,
    effect::EffectKind,
    error::{EconError, EconResult},
    event::LedgerEvent,
    profile::Profile,
    subsystem::SweepSubsystem,
    types::{Coins, Timestamp},
};
use chrono::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub profile: Profile,
    pub events:  Vec<LedgerEvent>,
}

/// Bring `profile` up to `now`. The input is never modified; on error no
/// partial result escapes.
pub fn reconcile(
    profile: &Profile,
    now: Timestamp,
    config: &AccrualConfig,
) -> EconResult<Reconciliation> {
    let mut next = profile.clone();
    let mut events = Vec::new();

    if let Some(event) = accrue_job_income(&mut next, now)? {
        events.push(event);
    }
    if let Some(event) = compound_interest(&mut next, now, config.bank_interest_per_hour)? {
        events.push(event);
    }

    Ok(Reconciliation { profile: next, events })
}

/// Hourly income with a job boost of `percent` applied, rounded to the
/// nearest coin.
pub fn boosted_income(base: Coins, percent: u32) -> Coins {
    (base as f64 * (1.0 + f64::from(percent) / 100.0)).round() as Coins
}

/// Whole hours, out of the `hours` starting at `start`, that end on or
/// before `expires_at`.
fn covered_hours(start: Timestamp, expires_at: Timestamp, hours: i64) -> i64 {
    whole_hours_between(start, expires_at).min(hours)
}

fn accrue_job_income(p: &mut Profile, now: Timestamp) -> EconResult<Option<LedgerEvent>> {
    if p.job.is_none() {
        return Ok(None);
    }
    let hours = whole_hours_between(p.last_pay, now);
    if hours == 0 {
        return Ok(None);
    }

    let base = p.income.max(0);
    let (boosted_hours, boosted_rate) = match p.effects.get(&EffectKind::JobBoost) {
        Some(boost) => (
            covered_hours(p.last_pay, boost.expires_at, hours),
            boosted_income(base, boost.percent_or_zero()),
        ),
        None => (0, base),
    };

    let amount = boosted_rate
        .checked_mul(boosted_hours)
        .zip(base.checked_mul(hours - boosted_hours))
        .and_then(|(boosted, plain)| boosted.checked_add(plain))
        .ok_or(EconError::Overflow { context: "paying job income" })?;

    p.credit_wallet(amount)?;
    p.last_pay += Duration::hours(hours);

    Ok((amount > 0).then_some(LedgerEvent::JobIncomePaid {
        hours,
        boosted_hours,
        amount,
    }))
}

fn compound_interest(
    p: &mut Profile,
    now: Timestamp,
    base_rate: f64,
) -> EconResult<Option<LedgerEvent>> {
    let hours = whole_hours_between(p.last_interest, now);
    if hours == 0 {
        return Ok(None);
    }

    let before = p.bank;
    if before > 0 {
        let (boosted_hours, boost_rate) = match p.effects.get(&EffectKind::InterestBoost) {
            Some(boost) => (
                covered_hours(p.last_interest, boost.expires_at, hours),
                f64::from(boost.percent_or_zero()) / 100.0,
            ),
            None => (0, 0.0),
        };

        // Hour-by-hour, matching the sweep's one-hour-at-a-time behaviour.
        let mut value = before as f64;
        if base_rate + boost_rate > 0.0 {
            for _ in 0..boosted_hours {
                value *= 1.0 + base_rate + boost_rate;
            }
        }
        if base_rate > 0.0 {
            for _ in boosted_hours..hours {
                value *= 1.0 + base_rate;
            }
        }

        let after = value.floor();
        if !after.is_finite() || after >= Coins::MAX as f64 {
            return Err(EconError::Overflow { context: "compounding interest" });
        }
        p.bank = (after as Coins).max(before);
    }
    p.last_interest += Duration::hours(hours);

    Ok((p.bank != before).then_some(LedgerEvent::InterestCompounded {
        hours,
        before,
        after: p.bank,
    }))
}

/// Sweep-side wrapper around reconcile().
pub struct AccrualSubsystem {
    config: AccrualConfig,
}

impl AccrualSubsystem {
    pub fn new(config: AccrualConfig) -> Self {
        Self { config }
    }
}

impl SweepSubsystem for AccrualSubsystem {
    fn name(&self) -> &'static str { "accrual" }

    fn sweep_profile(&self, profile: &mut Profile, now: Timestamp) -> EconResult<Vec<LedgerEvent>> {
        let Reconciliation { profile: next, events } = reconcile(profile, now, &self.config)?;
        *profile = next;
        Ok(events)
    }
}
