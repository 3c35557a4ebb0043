//! Sweep tests: background reconciliation over every profile, failure
//! isolation, and agreement with on-demand reconciliation.

use casino_core::{
    clock::ManualClock,
    command::PlayerCommand,
    effect::EffectKind,
    engine::Economy,
    types::Timestamp,
};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

// ── Test helpers ────────────────────────────────────────────────────────────

fn t0() -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 4, 20).unwrap().and_hms_opt(6, 15, 0).unwrap()
}

fn build(seed: u64) -> (Economy, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    (Economy::build_test(seed, clock.clone()), clock)
}

fn hire(eco: &Economy, user: &str, income: i64) {
    let mut p = eco.execute(user, PlayerCommand::Start).unwrap().profile;
    p.job = Some("Baker".into());
    p.income = income;
    eco.put_profile(user, p).unwrap();
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// One sweep pays job income and interest to every stored profile.
#[test]
fn sweep_pays_every_profile() {
    let (eco, clock) = build(1);
    hire(&eco, "a", 150);
    hire(&eco, "b", 300);
    eco.execute("c", PlayerCommand::Deposit { amount: 1000 }).unwrap();

    clock.advance(Duration::hours(3) + Duration::minutes(10));
    let report = eco.sweep().unwrap();
    assert_eq!(report.profiles, 3);
    assert_eq!(report.updated, 3);
    assert!(report.failed.is_empty());

    assert_eq!(eco.profile("a").unwrap().wallet, 1000 + 450);
    assert_eq!(eco.profile("b").unwrap().wallet, 1000 + 900);
    assert_eq!(eco.profile("c").unwrap().bank, 1030);
}

#[test]
fn sweep_is_idempotent_at_the_same_instant() {
    let (eco, clock) = build(1);
    hire(&eco, "a", 150);
    clock.advance(Duration::hours(2));

    eco.sweep().unwrap();
    let once = eco.profile("a").unwrap();
    let report = eco.sweep().unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.events, 0);
    assert_eq!(eco.profile("a").unwrap(), once);
}

/// Sweeping between commands does not change what a profile ends up with.
#[test]
fn sweep_and_commands_agree_in_any_order() {
    let (swept, swept_clock) = build(1);
    let (direct, direct_clock) = build(1);
    for eco in [&swept, &direct] {
        hire(eco, "a", 200);
        eco.execute("a", PlayerCommand::ShopBuy { key: "job_boost".into() }).unwrap();
    }

    for _ in 0..30 {
        swept_clock.advance(Duration::minutes(25));
        swept.sweep().unwrap();
    }
    direct_clock.advance(Duration::minutes(25 * 30));

    let a = swept.execute("a", PlayerCommand::Balance).unwrap().profile;
    let b = direct.execute("a", PlayerCommand::Balance).unwrap().profile;
    assert_eq!(a.wallet, b.wallet, "sweep cadence must not change job income");
    assert_eq!(a.last_pay, b.last_pay);
}

/// A profile whose accrual overflows is skipped and reported; the others are
/// still paid.
#[test]
fn one_failing_profile_does_not_block_the_rest() {
    let (eco, clock) = build(1);
    hire(&eco, "good", 150);
    let mut bad = eco.execute("bad", PlayerCommand::Start).unwrap().profile;
    bad.bank = i64::MAX - 1;
    eco.put_profile("bad", bad.clone()).unwrap();

    clock.advance(Duration::hours(1));
    let report = eco.sweep().unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad");
    assert_eq!(eco.profile("bad").unwrap(), bad, "failed profile is left untouched");
    assert_eq!(eco.profile("good").unwrap().wallet, 1150);
}

#[test]
fn sweep_removes_expired_effects_and_cooldowns() {
    let (eco, clock) = build(1);
    eco.execute("a", PlayerCommand::ShopBuy { key: "shield".into() }).unwrap();
    eco.execute("c", PlayerCommand::Start).unwrap();
    eco.execute("b", PlayerCommand::Rob { target: "c".into() }).unwrap();

    clock.advance(Duration::hours(25));
    eco.sweep().unwrap();
    assert!(!eco.profile("a").unwrap().effects.contains_key(&EffectKind::Shield));
    assert_eq!(eco.profile("b").unwrap().rob_cooldown_until, None);
}
