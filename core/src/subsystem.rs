//! Sweep subsystem trait.
//!
//! RULE: Every background concern implements SweepSubsystem.
//! The Economy sweep calls sweep_profile() on each registered subsystem,
//! in registration order, for every profile. A subsystem error discards
//! that profile's working copy; the sweep moves on to the next profile.

use crate::{
    error::EconResult,
    event::LedgerEvent,
    profile::Profile,
    types::Timestamp,
};

pub trait SweepSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Bring one profile up to `now`. Must be idempotent: a second call
    /// with the same `now` returns no events and changes nothing.
    fn sweep_profile(&self, profile: &mut Profile, now: Timestamp) -> EconResult<Vec<LedgerEvent>>;
}
