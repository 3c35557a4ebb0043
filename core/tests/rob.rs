//! Rob tests: self-targeting, shields, cooldowns, and balance movement.

use casino_core::{
    clock::ManualClock,
    command::PlayerCommand,
    engine::Economy,
    error::EconError,
    event::LedgerEvent,
    types::Timestamp,
};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

// ── Test helpers ────────────────────────────────────────────────────────────

fn t0() -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 11, 11).unwrap().and_hms_opt(20, 0, 0).unwrap()
}

fn build(seed: u64) -> (Economy, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    (Economy::build_test(seed, clock.clone()), clock)
}

fn rob(target: &str) -> PlayerCommand {
    PlayerCommand::Rob { target: target.into() }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn cannot_rob_yourself() {
    let (eco, _) = build(3);
    let err = eco.execute("mallory", rob("mallory")).unwrap_err();
    assert!(matches!(err, EconError::SelfTargetNotAllowed));
}

/// A shielded target blocks the attempt before the robber's cooldown starts.
#[test]
fn shield_blocks_rob_without_consuming_cooldown() {
    let (eco, _) = build(3);
    eco.execute("victim", PlayerCommand::ShopBuy { key: "shield".into() }).unwrap();
    eco.execute("mallory", PlayerCommand::Start).unwrap();

    let err = eco.execute("mallory", rob("victim")).unwrap_err();
    assert!(matches!(err, EconError::TargetShielded), "got {err:?}");
    assert_eq!(eco.profile("mallory").unwrap().rob_cooldown_until, None);
    assert_eq!(eco.profile("victim").unwrap().wallet, 500);
}

#[test]
fn expired_shield_no_longer_protects() {
    let (eco, clock) = build(3);
    eco.execute("victim", PlayerCommand::ShopBuy { key: "shield".into() }).unwrap();
    clock.advance(Duration::hours(24) + Duration::seconds(1));

    eco.execute("mallory", rob("victim")).expect("shield has expired");
    assert!(eco.profile("victim").unwrap().effects.is_empty());
}

/// Success or failure, an attempt starts the cooldown, and a second attempt
/// inside it reports the time left.
#[test]
fn any_attempt_starts_the_cooldown() {
    let (eco, clock) = build(3);
    eco.execute("victim", PlayerCommand::Start).unwrap();

    eco.execute("mallory", rob("victim")).unwrap();
    let until = eco.profile("mallory").unwrap().rob_cooldown_until;
    assert_eq!(until, Some(t0() + Duration::minutes(60)));

    clock.advance(Duration::minutes(20));
    let err = eco.execute("mallory", rob("victim")).unwrap_err();
    assert!(
        matches!(err, EconError::CooldownActive { remaining_secs: 2400 }),
        "expected 40 minutes left, got {err:?}"
    );

    clock.advance(Duration::minutes(40));
    eco.execute("mallory", rob("victim")).expect("cooldown has passed");
}

/// Across many seeds, loot moves from target to robber and fines leave the
/// robber without reaching the target.
#[test]
fn rob_moves_coins_between_the_two_profiles_only() {
    for seed in 0..20 {
        let (eco, _) = build(seed);
        eco.execute("victim", PlayerCommand::Start).unwrap();
        eco.execute("mallory", PlayerCommand::Start).unwrap();

        let reply = eco.execute("mallory", rob("victim")).unwrap();
        let robber = eco.profile("mallory").unwrap().wallet;
        let target = eco.profile("victim").unwrap().wallet;
        match reply.events.last() {
            Some(LedgerEvent::RobAttempted { success: true, amount, .. }) => {
                assert!((100..=500).contains(amount));
                assert_eq!((robber, target), (1000 + amount, 1000 - amount));
            }
            Some(LedgerEvent::RobAttempted { success: false, amount, .. }) => {
                assert!((50..=150).contains(amount));
                assert_eq!((robber, target), (1000 - amount, 1000));
            }
            other => panic!("seed {seed}: unexpected last event {other:?}"),
        }
    }
}

#[test]
fn loot_is_capped_at_the_target_wallet() {
    for seed in 0..20 {
        let (eco, _) = build(seed);
        let mut poor = eco.execute("victim", PlayerCommand::Start).unwrap().profile;
        poor.wallet = 30;
        eco.put_profile("victim", poor).unwrap();

        eco.execute("mallory", rob("victim")).unwrap();
        let target = eco.profile("victim").unwrap().wallet;
        assert!(target == 0 || target == 30, "seed {seed}: target wallet {target}");
    }
}

/// Robbing an id with no stored profile is refused. No profile is created
/// for it and the robber's cooldown does not start.
#[test]
fn unknown_target_is_refused_without_creating_a_profile() {
    let (eco, _) = build(3);
    eco.execute("mallory", PlayerCommand::Start).unwrap();

    let err = eco.execute("mallory", rob("ghost")).unwrap_err();
    assert!(
        matches!(&err, EconError::UnknownTarget { target } if target == "ghost"),
        "got {err:?}"
    );
    assert!(eco.profile("ghost").is_none(), "no coins minted for an unknown id");
    assert_eq!(eco.profile_count(), 1);
    assert_eq!(eco.profile("mallory").unwrap().rob_cooldown_until, None);
}
