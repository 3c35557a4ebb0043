//! Effect registry: time-boxed modifiers attached to a profile.
//!
//! An effect is active iff `now < expires_at`. Expiry is lazy: consulting
//! an expired effect through `is_active` removes it from the profile, which
//! the caller must then persist. `lookup` is the read-only variant.

use crate::{
    clock::checked_after,
    error::EconResult,
    profile::Profile,
    types::Timestamp,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Blocks rob attempts against the holder.
    Shield,
    /// Multiplies hourly job income by (1 + percent/100).
    JobBoost,
    /// Nudges mini-game win chances by percent/100.
    LuckBoost,
    /// Adds percent/100 to the hourly bank interest rate.
    InterestBoost,
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shield => "shield",
            Self::JobBoost => "job_boost",
            Self::LuckBoost => "luck_boost",
            Self::InterestBoost => "interest_boost",
        }
    }

    pub fn takes_percent(&self) -> bool {
        !matches!(self, Self::Shield)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(with = "crate::clock::iso")]
    pub expires_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
}

impl Effect {
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }

    pub fn percent_or_zero(&self) -> u32 {
        self.percent.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectLookup {
    Active(Effect),
    Expired,
    Absent,
}

/// Read-only check. Never mutates the profile.
pub fn lookup(profile: &Profile, kind: EffectKind, now: Timestamp) -> EffectLookup {
    match profile.effects.get(&kind) {
        Some(effect) if effect.is_active_at(now) => EffectLookup::Active(*effect),
        Some(_) => EffectLookup::Expired,
        None => EffectLookup::Absent,
    }
}

/// Returns the effect if active. An expired entry is removed first, so a
/// `None` may still mean the profile changed.
pub fn is_active(profile: &mut Profile, kind: EffectKind, now: Timestamp) -> Option<Effect> {
    match lookup(profile, kind, now) {
        EffectLookup::Active(effect) => Some(effect),
        EffectLookup::Expired => {
            profile.effects.remove(&kind);
            log::debug!("effect: {} expired and removed", kind.name());
            None
        }
        EffectLookup::Absent => None,
    }
}

/// Active percent for a boost kind, or 0.
pub fn active_percent(profile: &mut Profile, kind: EffectKind, now: Timestamp) -> u32 {
    is_active(profile, kind, now).map_or(0, |e| e.percent_or_zero())
}

/// Set or overwrite `kind`. Durations and percents replace, never stack.
pub fn grant(
    profile: &mut Profile,
    kind: EffectKind,
    duration: Duration,
    percent: Option<u32>,
    now: Timestamp,
) -> EconResult<Effect> {
    let effect = Effect {
        expires_at: checked_after(now, duration, "granting an effect")?,
        percent: if kind.takes_percent() { percent } else { None },
    };
    profile.effects.insert(kind, effect);
    Ok(effect)
}

/// Remove every expired effect; returns the kinds removed.
pub fn purge_expired(profile: &mut Profile, now: Timestamp) -> Vec<EffectKind> {
    let expired: Vec<EffectKind> = profile
        .effects
        .iter()
        .filter(|(_, e)| !e.is_active_at(now))
        .map(|(k, _)| *k)
        .collect();
    for kind in &expired {
        profile.effects.remove(kind);
    }
    expired
}
