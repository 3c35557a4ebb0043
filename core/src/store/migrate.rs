//! Load-time normalisation of the profile document.
//!
//! Runs once per load, before typed decoding. Older documents are brought
//! up to SCHEMA_VERSION by:
//!   1. versioned renames (v1: `money` → `wallet`)
//!   2. the default-fill table: every field absent (or null where a value
//!      is required) gets its default
//!   3. value repairs: unparseable timestamps, negative balances, unknown
//!      effect kinds
//! Unknown fields are left alone; Profile carries them through.

use crate::{
    clock::{format_timestamp, parse_timestamp},
    effect::EffectKind,
    types::Timestamp,
};
use serde_json::{json, Map, Value};

pub const SCHEMA_VERSION: u32 = 2;

type DefaultFn = fn(Timestamp) -> Value;

/// (schema version that introduced the field, field, default)
const FIELD_DEFAULTS: &[(u32, &str, DefaultFn)] = &[
    (1, "wallet",             zero),
    (1, "bank",               zero),
    (1, "inventory",          empty_list),
    (1, "job",                null),
    (1, "income",             zero),
    (1, "last_pay",           timestamp_now),
    (1, "job_offers",         empty_list),
    (1, "offers_expires",     null),
    (1, "last_interest",      timestamp_now),
    (2, "effects",            empty_map),
    (2, "rob_cooldown_until", null),
];

const REQUIRED_TIMESTAMPS: &[&str] = &["last_pay", "last_interest"];
const OPTIONAL_TIMESTAMPS: &[&str] = &["offers_expires", "rob_cooldown_until"];
const NON_NEGATIVE_COINS: &[&str] = &["wallet", "bank", "income"];
const STRING_LISTS: &[&str] = &["inventory", "job_offers"];

fn zero(_: Timestamp) -> Value { json!(0) }
fn null(_: Timestamp) -> Value { Value::Null }
fn empty_list(_: Timestamp) -> Value { json!([]) }
fn empty_map(_: Timestamp) -> Value { json!({}) }
fn timestamp_now(now: Timestamp) -> Value { json!(format_timestamp(&now)) }

/// Bring one profile object up to SCHEMA_VERSION. Returns the number of
/// repairs made (renames and defaults filled are not counted).
pub fn normalize_profile(
    user_id: &str,
    profile: &mut Map<String, Value>,
    from_version: u32,
    now: Timestamp,
) -> usize {
    if from_version < 1 && !profile.contains_key("wallet") {
        if let Some(money) = profile.remove("money") {
            profile.insert("wallet".into(), money);
        }
    }

    for (_since, field, default) in FIELD_DEFAULTS {
        if !profile.contains_key(*field) {
            profile.insert((*field).to_string(), default(now));
        }
    }

    let mut repairs = 0;
    let mut repair = |what: String| {
        log::warn!("store: user {user_id}: {what}");
        repairs += 1;
    };

    for field in NON_NEGATIVE_COINS {
        let value = &profile[*field];
        let coins = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
            _ => None,
        };
        let fixed = coins.unwrap_or(0).max(0);
        if coins != Some(fixed) || !value.is_i64() {
            repair(format!("{field} {value} repaired to {fixed}"));
            profile.insert((*field).to_string(), json!(fixed));
        }
    }

    for field in REQUIRED_TIMESTAMPS {
        if !is_timestamp(&profile[*field]) {
            repair(format!("{field} {} reset to load time", profile[*field]));
            profile.insert((*field).to_string(), timestamp_now(now));
        }
    }
    for field in OPTIONAL_TIMESTAMPS {
        let value = &profile[*field];
        if !value.is_null() && !is_timestamp(value) {
            repair(format!("{field} {value} cleared"));
            profile.insert((*field).to_string(), Value::Null);
        }
    }

    for field in STRING_LISTS {
        let value = &profile[*field];
        let valid = value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !valid {
            repair(format!("{field} {value} was not a list of names; cleared"));
            profile.insert((*field).to_string(), json!([]));
        }
    }

    let job = &profile["job"];
    if !job.is_null() && !job.is_string() {
        repair(format!("job {job} cleared"));
        profile.insert("job".into(), Value::Null);
    }

    let mut effects = match profile.remove("effects") {
        Some(Value::Object(map)) => map,
        Some(other) => {
            repair(format!("effects {other} was not a map; cleared"));
            Map::new()
        }
        None => Map::new(),
    };
    effects.retain(|kind, effect| {
        let known = serde_json::from_value::<EffectKind>(json!(kind)).is_ok();
        let timed = effect.get("expires_at").is_some_and(is_timestamp);
        if !(known && timed) {
            repair(format!("dropped unusable effect '{kind}': {effect}"));
            return false;
        }
        let Some(raw) = effect.get("percent").filter(|v| !v.is_null()) else {
            return true;
        };
        if raw.as_u64().is_some_and(|p| p <= u64::from(u32::MAX)) {
            return true;
        }
        match raw.as_f64().filter(|f| f.is_finite()) {
            Some(f) => {
                let fixed = f.floor().clamp(0.0, f64::from(u32::MAX)) as u32;
                repair(format!("effect '{kind}' percent {raw} repaired to {fixed}"));
                effect["percent"] = json!(fixed);
                true
            }
            None => {
                repair(format!("dropped effect '{kind}' with unusable percent {raw}"));
                false
            }
        }
    });
    profile.insert("effects".into(), Value::Object(effects));

    repairs
}

fn is_timestamp(value: &Value) -> bool {
    value.as_str().and_then(parse_timestamp).is_some()
}
