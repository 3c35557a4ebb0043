//! Shared primitive types used across the whole economy.

/// Integer currency units. Signed so that a debit can be checked before it
/// is applied; persisted balances are never negative.
pub type Coins = i64;

/// Chat-platform user identifier, kept as the platform's string form.
pub type UserId = String;

/// Naive UTC instant. All persisted times use this representation.
pub type Timestamp = chrono::NaiveDateTime;
