//! Moves between wallet and bank. Both checks happen before either
//! balance changes.

use crate::{
    error::{EconError, EconResult},
    event::LedgerEvent,
    profile::Profile,
    types::Coins,
};

pub(crate) fn ensure_positive(amount: Coins) -> EconResult<()> {
    if amount <= 0 {
        return Err(EconError::InvalidAmount { amount });
    }
    Ok(())
}

pub fn deposit(profile: &mut Profile, amount: Coins) -> EconResult<LedgerEvent> {
    ensure_positive(amount)?;
    let bank = profile
        .bank
        .checked_add(amount)
        .ok_or(EconError::Overflow { context: "depositing" })?;
    profile.debit_wallet(amount)?;
    profile.bank = bank;
    Ok(LedgerEvent::Deposited { amount })
}

pub fn withdraw(profile: &mut Profile, amount: Coins) -> EconResult<LedgerEvent> {
    ensure_positive(amount)?;
    if amount > profile.bank {
        return Err(EconError::InsufficientFunds {
            needed: amount,
            available: profile.bank,
        });
    }
    let wallet = profile
        .wallet
        .checked_add(amount)
        .ok_or(EconError::Overflow { context: "withdrawing" })?;
    profile.bank -= amount;
    profile.wallet = wallet;
    Ok(LedgerEvent::Withdrew { amount })
}
