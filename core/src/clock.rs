//! Wall-clock source and timestamp helpers.
//!
//! RULE: Ledger arithmetic never reads the system clock directly.
//! Pure functions take `now` as an argument; the Economy service asks its
//! `Clock` once per operation and threads that instant through.

use crate::{
    error::{EconError, EconResult},
    types::Timestamp,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Canonical persisted form. `%.f` prints 0, 3, 6 or 9 fractional digits,
/// so format → parse reproduces the instant exactly.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The real UTC clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().naive_utc()
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { current: Mutex::new(start) }
    }

    pub fn set(&self, to: Timestamp) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn advance(&self, by: Duration) -> Timestamp {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
        *current
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `hours` as a Duration, or Overflow when it is out of range.
pub fn try_hours(hours: i64, context: &'static str) -> EconResult<Duration> {
    Duration::try_hours(hours).ok_or(EconError::Overflow { context })
}

pub fn try_minutes(minutes: i64, context: &'static str) -> EconResult<Duration> {
    Duration::try_minutes(minutes).ok_or(EconError::Overflow { context })
}

/// `start + by`, or Overflow when the instant is not representable.
pub fn checked_after(start: Timestamp, by: Duration, context: &'static str) -> EconResult<Timestamp> {
    start.checked_add_signed(by).ok_or(EconError::Overflow { context })
}

/// Whole hours elapsed from `since` to `now`. Zero when `now <= since`.
pub fn whole_hours_between(since: Timestamp, now: Timestamp) -> i64 {
    (now - since).num_hours().max(0)
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// Parse a persisted timestamp. Accepts the canonical form, the
/// space-separated form, and RFC 3339 with an offset (converted to UTC).
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    Timestamp::parse_from_str(raw, ISO_FORMAT)
        .or_else(|_| Timestamp::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).naive_utc())
        })
}

/// `#[serde(with = "crate::clock::iso")]` for required timestamps.
pub mod iso {
    use super::{format_timestamp, parse_timestamp};
    use crate::types::Timestamp;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

/// `#[serde(with = "crate::clock::iso_opt")]` for nullable timestamps.
pub mod iso_opt {
    use super::{format_timestamp, parse_timestamp};
    use crate::types::Timestamp;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&format_timestamp(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'"))),
        }
    }
}
