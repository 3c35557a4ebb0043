//! The per-user profile record and its whole-record helpers.

use crate::{
    effect::{Effect, EffectKind},
    error::{EconError, EconResult},
    types::{Coins, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub wallet:    Coins,
    pub bank:      Coins,
    pub inventory: Vec<String>,

    pub job:    Option<String>,
    /// Base coins per hour, before any job boost.
    pub income: Coins,
    #[serde(with = "crate::clock::iso")]
    pub last_pay: Timestamp,

    pub job_offers: Vec<String>,
    #[serde(with = "crate::clock::iso_opt")]
    pub offers_expires: Option<Timestamp>,

    #[serde(with = "crate::clock::iso")]
    pub last_interest: Timestamp,

    pub effects: BTreeMap<EffectKind, Effect>,
    #[serde(with = "crate::clock::iso_opt")]
    pub rob_cooldown_until: Option<Timestamp>,

    /// Fields written by newer or older versions that this one does not
    /// interpret. Carried through load/save untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Profile {
    pub fn new(starting_wallet: Coins, now: Timestamp) -> Self {
        Self {
            wallet: starting_wallet,
            bank: 0,
            inventory: Vec::new(),
            job: None,
            income: 0,
            last_pay: now,
            job_offers: Vec::new(),
            offers_expires: None,
            last_interest: now,
            effects: BTreeMap::new(),
            rob_cooldown_until: None,
            extra: BTreeMap::new(),
        }
    }

    /// Take `amount` from the wallet, or fail without touching it.
    pub fn debit_wallet(&mut self, amount: Coins) -> EconResult<()> {
        if amount > self.wallet {
            return Err(EconError::InsufficientFunds {
                needed: amount,
                available: self.wallet,
            });
        }
        self.wallet -= amount;
        Ok(())
    }

    pub fn credit_wallet(&mut self, amount: Coins) -> EconResult<()> {
        self.wallet = self
            .wallet
            .checked_add(amount)
            .ok_or(EconError::Overflow { context: "crediting wallet" })?;
        Ok(())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inventory = if self.inventory.is_empty() {
            "Empty".to_string()
        } else {
            self.inventory.join(", ")
        };
        writeln!(f, "Wallet: ${}", self.wallet)?;
        writeln!(f, "Bank: ${}", self.bank)?;
        writeln!(f, "Inventory: {inventory}")?;
        match &self.job {
            Some(job) => write!(f, "Job: {job} ({} coins/hour)", self.income),
            None => write!(f, "Job: None"),
        }
    }
}
