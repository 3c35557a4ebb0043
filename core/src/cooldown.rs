//! Cooldown tracker for the rob action.
//!
//! A profile may not start another rob until `rob_cooldown_until` has
//! passed. Every attempt that gets past the target checks restarts the
//! window, whether the rob succeeds or fails.

use crate::{
    clock::checked_after,
    error::{EconError, EconResult},
    profile::Profile,
    types::Timestamp,
};
use chrono::Duration;

/// Fail with CooldownActive if the window is still running. Does not
/// start a new window.
pub fn check_cooldown(profile: &Profile, now: Timestamp) -> EconResult<()> {
    match profile.rob_cooldown_until {
        Some(until) if now < until => Err(EconError::CooldownActive {
            remaining_secs: (until - now).num_seconds().max(1),
        }),
        _ => Ok(()),
    }
}

/// Check the window and, if clear, start a new one ending at `now + duration`.
pub fn try_start_cooldown(profile: &mut Profile, now: Timestamp, duration: Duration) -> EconResult<()> {
    check_cooldown(profile, now)?;
    profile.rob_cooldown_until = Some(checked_after(now, duration, "starting the rob cooldown")?);
    Ok(())
}

/// Drop a finished window. Returns true if one was cleared.
pub fn clear_expired(profile: &mut Profile, now: Timestamp) -> bool {
    match profile.rob_cooldown_until {
        Some(until) if now >= until => {
            profile.rob_cooldown_until = None;
            true
        }
        _ => false,
    }
}
