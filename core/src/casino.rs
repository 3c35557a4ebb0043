//! Mini-games and crime: independent random draws layered on the ledger.
//!
//! Each game validates the bet against the wallet before drawing, so a
//! loss can never push the wallet below zero. Luck boosts add
//! percent/100 to a win chance, capped at `luck_cap`.

use crate::{
    bank::ensure_positive,
    clock,
    config::{CrimeBands, CrimeConfig, RobConfig},
    cooldown,
    effect::{self, EffectKind},
    error::{EconError, EconResult},
    event::LedgerEvent,
    profile::Profile,
    rng::StreamRng,
    types::{Coins, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouletteChoice {
    Red,
    Black,
    Odd,
    Even,
}

impl RouletteChoice {
    pub const ALL: [RouletteChoice; 4] = [Self::Red, Self::Black, Self::Odd, Self::Even];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Black => "Black",
            Self::Odd => "Odd",
            Self::Even => "Even",
        }
    }
}

impl FromStr for RouletteChoice {
    type Err = EconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "black" => Ok(Self::Black),
            "odd" => Ok(Self::Odd),
            "even" => Ok(Self::Even),
            _ => Err(EconError::InvalidChoice { choice: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrimeKind {
    /// Rob a store (not another player).
    Store,
    Scam,
}

impl CrimeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Scam => "scam",
        }
    }

    fn bands<'a>(&self, config: &'a CrimeConfig) -> &'a CrimeBands {
        match self {
            Self::Store => &config.store,
            Self::Scam => &config.scam,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouletteOutcome {
    pub landed: RouletteChoice,
    pub won:    bool,
    pub event:  LedgerEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlackjackOutcome {
    pub player: i64,
    pub dealer: i64,
    pub event:  LedgerEvent,
}

/// Base chance nudged by an active luck boost, never above `cap` unless
/// the base already is.
pub fn luck_adjusted(base: f64, luck_percent: u32, cap: f64) -> f64 {
    (base + f64::from(luck_percent) / 100.0).min(cap.max(base))
}

fn check_bet(profile: &Profile, bet: Coins) -> EconResult<()> {
    ensure_positive(bet)?;
    if bet > profile.wallet {
        return Err(EconError::InsufficientFunds { needed: bet, available: profile.wallet });
    }
    Ok(())
}

fn settle(profile: &mut Profile, game: &str, bet: Coins, delta: Coins) -> EconResult<LedgerEvent> {
    if delta >= 0 {
        profile.credit_wallet(delta)?;
    } else {
        profile.debit_wallet(-delta)?;
    }
    Ok(LedgerEvent::BetSettled { game: game.to_string(), bet, delta })
}

/// Even-money bet on one of four outcomes. With luck, a first roll of
/// `luck/100` lands the wheel on the player's choice outright.
pub fn roulette(
    profile: &mut Profile,
    bet: Coins,
    choice: RouletteChoice,
    now: Timestamp,
    luck_cap: f64,
    rng: &mut StreamRng,
) -> EconResult<RouletteOutcome> {
    check_bet(profile, bet)?;
    let luck = effect::active_percent(profile, EffectKind::LuckBoost, now);

    let landed = if luck > 0 && rng.chance(luck_adjusted(0.0, luck, luck_cap)) {
        choice
    } else {
        RouletteChoice::ALL[rng.below(RouletteChoice::ALL.len())]
    };
    let won = landed == choice;
    let event = settle(profile, "roulette", bet, if won { bet } else { -bet })?;
    Ok(RouletteOutcome { landed, won, event })
}

/// One card each, 1..=11. Higher card wins even money; a tie pushes.
/// With luck, a losing player card is redrawn once with chance luck/100.
pub fn blackjack(
    profile: &mut Profile,
    bet: Coins,
    now: Timestamp,
    luck_cap: f64,
    rng: &mut StreamRng,
) -> EconResult<BlackjackOutcome> {
    check_bet(profile, bet)?;
    let luck = effect::active_percent(profile, EffectKind::LuckBoost, now);

    let mut player = rng.range_inclusive(1, 11);
    let dealer = rng.range_inclusive(1, 11);
    if player < dealer && luck > 0 && rng.chance(luck_adjusted(0.0, luck, luck_cap)) {
        player = rng.range_inclusive(1, 11);
    }

    let delta = match player.cmp(&dealer) {
        std::cmp::Ordering::Greater => bet,
        std::cmp::Ordering::Less => -bet,
        std::cmp::Ordering::Equal => 0,
    };
    let event = settle(profile, "blackjack", bet, delta)?;
    Ok(BlackjackOutcome { player, dealer, event })
}

/// Rob a store or run a scam. Fines are capped at the wallet.
pub fn commit_crime(
    profile: &mut Profile,
    kind: CrimeKind,
    config: &CrimeConfig,
    now: Timestamp,
    luck_cap: f64,
    rng: &mut StreamRng,
) -> EconResult<LedgerEvent> {
    let luck = effect::active_percent(profile, EffectKind::LuckBoost, now);
    let bands = kind.bands(config);

    let success = rng.chance(luck_adjusted(config.success_chance, luck, luck_cap));
    let delta = if success {
        let reward = rng.range_inclusive(bands.reward.min, bands.reward.max);
        profile.credit_wallet(reward)?;
        reward
    } else {
        let fine = rng.range_inclusive(bands.fine.min, bands.fine.max).min(profile.wallet);
        profile.debit_wallet(fine)?;
        -fine
    };

    Ok(LedgerEvent::CrimeCommitted {
        crime: kind.name().to_string(),
        success,
        delta,
    })
}

/// Player-vs-player rob. Order of checks: self-target, robber cooldown,
/// target shield. A shielded target blocks the attempt before the cooldown
/// starts; any attempt past the shield starts it, win or lose.
#[allow(clippy::too_many_arguments)]
pub fn rob(
    robber_id: &str,
    robber: &mut Profile,
    target_id: &str,
    target: &mut Profile,
    config: &RobConfig,
    now: Timestamp,
    luck_cap: f64,
    rng: &mut StreamRng,
) -> EconResult<LedgerEvent> {
    if robber_id == target_id {
        return Err(EconError::SelfTargetNotAllowed);
    }
    cooldown::check_cooldown(robber, now)?;
    if effect::is_active(target, EffectKind::Shield, now).is_some() {
        return Err(EconError::TargetShielded);
    }
    let window = clock::try_minutes(config.cooldown_minutes, "sizing the rob cooldown")?;
    cooldown::try_start_cooldown(robber, now, window)?;

    let luck = effect::active_percent(robber, EffectKind::LuckBoost, now);
    let success = rng.chance(luck_adjusted(config.success_chance, luck, luck_cap));

    let amount = if success {
        let loot = rng.range_inclusive(config.loot.min, config.loot.max).min(target.wallet);
        target.debit_wallet(loot)?;
        robber.credit_wallet(loot)?;
        loot
    } else {
        let fine = rng.range_inclusive(config.fine.min, config.fine.max).min(robber.wallet);
        robber.debit_wallet(fine)?;
        fine
    };

    Ok(LedgerEvent::RobAttempted {
        target: target_id.to_string(),
        success,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luck_is_capped() {
        assert_eq!(luck_adjusted(0.5, 0, 0.95), 0.5);
        assert!((luck_adjusted(0.5, 10, 0.95) - 0.6).abs() < 1e-12);
        assert_eq!(luck_adjusted(0.5, 90, 0.95), 0.95);
        assert_eq!(luck_adjusted(0.97, 10, 0.95), 0.97);
    }

    #[test]
    fn roulette_choice_parses_case_insensitively() {
        assert_eq!("RED".parse::<RouletteChoice>().unwrap(), RouletteChoice::Red);
        assert!(matches!(
            "green".parse::<RouletteChoice>(),
            Err(EconError::InvalidChoice { .. })
        ));
    }
}
