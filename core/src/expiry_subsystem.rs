//! Expiry subsystem: proactive cleanup of expired effects and finished
//! rob cooldowns during the sweep. Reads already self-clean; this keeps
//! idle profiles tidy too.

use crate::{
    cooldown,
    effect,
    error::EconResult,
    event::LedgerEvent,
    profile::Profile,
    subsystem::SweepSubsystem,
    types::Timestamp,
};

#[derive(Debug, Default)]
pub struct ExpirySubsystem;

impl ExpirySubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl SweepSubsystem for ExpirySubsystem {
    fn name(&self) -> &'static str { "expiry" }

    fn sweep_profile(&self, profile: &mut Profile, now: Timestamp) -> EconResult<Vec<LedgerEvent>> {
        let mut out: Vec<LedgerEvent> = effect::purge_expired(profile, now)
            .into_iter()
            .map(|kind| LedgerEvent::EffectExpired { kind })
            .collect();
        if cooldown::clear_expired(profile, now) {
            out.push(LedgerEvent::CooldownCleared);
        }
        Ok(out)
    }
}
