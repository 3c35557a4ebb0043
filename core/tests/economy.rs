//! Economy service tests: command flow, reconcile-before-act, and the
//! bank and shop surfaces.

use casino_core::{
    casino::CrimeKind,
    catalog::{ItemType, ShopCatalog, ShopItem},
    clock::ManualClock,
    command::{PlayerCommand, QueuedCommand},
    effect::EffectKind,
    engine::Economy,
    error::EconError,
    event::LedgerEvent,
    types::Timestamp,
};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

// ── Test helpers ────────────────────────────────────────────────────────────

fn t0() -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

fn build(seed: u64) -> (Economy, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    (Economy::build_test(seed, clock.clone()), clock)
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// The first command from an unknown user creates their profile once.
#[test]
fn first_command_creates_profile_with_starting_wallet() {
    let (eco, _) = build(1);
    let reply = eco.execute("alice", PlayerCommand::Start).unwrap();
    assert_eq!(reply.profile.wallet, 1000);
    assert_eq!(reply.events, vec![LedgerEvent::ProfileCreated { wallet: 1000 }]);
    assert!(reply.message.contains("Wallet: $1000"));

    let again = eco.execute("alice", PlayerCommand::Stats).unwrap();
    assert!(again.events.is_empty(), "profile is only created once");
    assert_eq!(eco.profile_count(), 1);
}

#[test]
fn deposit_then_withdraw_restores_balances() {
    let (eco, _) = build(1);
    eco.execute("bob", PlayerCommand::Deposit { amount: 200 }).unwrap();
    let mid = eco.profile("bob").unwrap();
    assert_eq!((mid.wallet, mid.bank), (800, 200));

    let reply = eco.execute("bob", PlayerCommand::Withdraw { amount: 200 }).unwrap();
    assert_eq!((reply.profile.wallet, reply.profile.bank), (1000, 0));
}

/// Overdrafts and non-positive amounts are rejected and nothing is written.
#[test]
fn bank_rejects_bad_amounts_without_changes() {
    let (eco, _) = build(1);
    eco.execute("bob", PlayerCommand::Start).unwrap();

    let err = eco.execute("bob", PlayerCommand::Deposit { amount: 1001 }).unwrap_err();
    assert!(matches!(err, EconError::InsufficientFunds { needed: 1001, available: 1000 }));
    let err = eco.execute("bob", PlayerCommand::Withdraw { amount: 1 }).unwrap_err();
    assert!(matches!(err, EconError::InsufficientFunds { available: 0, .. }));
    let err = eco.execute("bob", PlayerCommand::Deposit { amount: 0 }).unwrap_err();
    assert!(matches!(err, EconError::InvalidAmount { amount: 0 }));

    let p = eco.profile("bob").unwrap();
    assert_eq!((p.wallet, p.bank), (1000, 0));
}

/// Income earned since the last command is credited before the command runs.
#[test]
fn commands_reconcile_before_acting() {
    let (eco, clock) = build(1);
    eco.execute("carol", PlayerCommand::Deposit { amount: 1000 }).unwrap();
    clock.advance(Duration::hours(3));

    // Withdraw more than was deposited: only possible once interest is paid.
    let reply = eco.execute("carol", PlayerCommand::Withdraw { amount: 1030 }).unwrap();
    assert_eq!(reply.profile.bank, 0);
    assert_eq!(reply.profile.wallet, 1030);
    assert!(matches!(reply.events[0], LedgerEvent::InterestCompounded { hours: 3, .. }));
}

/// A rejected command still persists the reconciliation that ran before it,
/// so the income is neither lost nor paid twice.
#[test]
fn failed_command_still_persists_accrued_income() {
    let (eco, clock) = build(1);
    let mut p = eco.execute("dave", PlayerCommand::Start).unwrap().profile;
    p.job = Some("Baker".into());
    p.income = 150;
    p.wallet = 0;
    eco.put_profile("dave", p).unwrap();
    clock.advance(Duration::hours(2));

    let err = eco.execute("dave", PlayerCommand::Deposit { amount: 10_000 }).unwrap_err();
    assert!(matches!(err, EconError::InsufficientFunds { available: 300, .. }));

    let stored = eco.profile("dave").unwrap();
    assert_eq!(stored.wallet, 300, "income reconciled before the failure is kept");
    assert_eq!(stored.last_pay, t0() + Duration::hours(2));

    // And never paid twice.
    let reply = eco.execute("dave", PlayerCommand::Balance).unwrap();
    assert_eq!(reply.profile.wallet, 300);
}

#[test]
fn jobs_then_claim_sets_income() {
    let (eco, clock) = build(11);
    let reply = eco.execute("erin", PlayerCommand::Jobs).unwrap();
    let offers = reply.profile.job_offers.clone();
    assert_eq!(offers.len(), 3);
    assert!(reply.message.contains("1. "));

    let reply = eco.execute("erin", PlayerCommand::Job { number: 1 }).unwrap();
    assert_eq!(reply.profile.job.as_deref(), Some(offers[0].as_str()));
    let income = reply.profile.income;

    clock.advance(Duration::hours(4));
    let reply = eco.execute("erin", PlayerCommand::Balance).unwrap();
    assert_eq!(reply.profile.wallet, 1000 + 4 * income);
}

/// Cosmetics land in the inventory, effect items in the effect registry,
/// and unknown or unaffordable keys are rejected.
#[test]
fn shop_sells_cosmetics_and_effects() {
    let (eco, _) = build(1);
    let reply = eco.execute("fay", PlayerCommand::ShopBuy { key: "WATCH".into() }).unwrap();
    assert_eq!(reply.profile.inventory, vec!["Watch".to_string()]);
    assert_eq!(reply.profile.wallet, 950);

    let reply = eco.execute("fay", PlayerCommand::ShopBuy { key: "job_boost".into() }).unwrap();
    let boost = reply.profile.effects[&EffectKind::JobBoost];
    assert_eq!(boost.percent, Some(25));
    assert_eq!(boost.expires_at, t0() + Duration::hours(12));
    assert_eq!(reply.profile.wallet, 550);

    let err = eco.execute("fay", PlayerCommand::ShopBuy { key: "yacht".into() }).unwrap_err();
    assert!(matches!(err, EconError::InvalidItemKey { .. }));
    let reply = eco.execute("fay", PlayerCommand::ShopBuy { key: "shield".into() }).unwrap();
    assert_eq!(reply.profile.wallet, 50);
    let err = eco.execute("fay", PlayerCommand::ShopBuy { key: "laptop".into() }).unwrap_err();
    assert!(matches!(err, EconError::InsufficientFunds { needed: 300, available: 50 }));
    assert_eq!(eco.profile("fay").unwrap().inventory.len(), 1);
}

/// A boost item without a percent is a catalog error raised before the debit.
#[test]
fn shop_rejects_misconfigured_effect_items() {
    let (eco, _) = build(1);
    eco.set_shop_catalog(ShopCatalog::new(vec![ShopItem {
        key:            "broken".into(),
        name:           "Broken Boost".into(),
        price:          10,
        item_type:      ItemType::JobBoost,
        percent:        None,
        duration_hours: Some(1),
    }]));

    let err = eco.execute("gus", PlayerCommand::ShopBuy { key: "broken".into() }).unwrap_err();
    assert!(matches!(err, EconError::InvalidCatalog { .. }), "got {err:?}");
    assert_eq!(eco.profile("gus").unwrap().wallet, 1000, "nothing charged");
}

/// An effect duration too large for the calendar is a catalog error. The
/// buyer is not charged and the economy keeps serving commands.
#[test]
fn shop_rejects_durations_past_the_calendar() {
    let (eco, _) = build(1);
    eco.set_shop_catalog(ShopCatalog::new(vec![ShopItem {
        key:            "forever".into(),
        name:           "Eternal Shield".into(),
        price:          10,
        item_type:      ItemType::Shield,
        percent:        None,
        duration_hours: Some(10_000_000_000),
    }]));

    let err = eco.execute("hal", PlayerCommand::ShopBuy { key: "forever".into() }).unwrap_err();
    assert!(matches!(err, EconError::InvalidCatalog { .. }), "got {err:?}");
    let stored = eco.profile("hal").unwrap();
    assert_eq!(stored.wallet, 1000, "nothing charged");
    assert!(stored.effects.is_empty(), "no effect granted");

    let reply = eco.execute("hal", PlayerCommand::Deposit { amount: 100 }).unwrap();
    assert_eq!(reply.profile.bank, 100, "economy keeps serving commands");
}

#[test]
fn bets_must_be_covered_by_the_wallet() {
    let (eco, _) = build(1);
    let err = eco
        .execute("hal", PlayerCommand::Blackjack { bet: 1001 })
        .unwrap_err();
    assert!(matches!(err, EconError::InsufficientFunds { .. }));
    let err = eco.execute("hal", PlayerCommand::Blackjack { bet: -5 }).unwrap_err();
    assert!(matches!(err, EconError::InvalidAmount { .. }));
}

/// Every roulette and blackjack round moves exactly the bet, in one direction.
#[test]
fn casino_games_move_exactly_the_bet() {
    let (eco, _) = build(99);
    let mut wallet = 1000;
    for _ in 0..50 {
        let cmd = PlayerCommand::Roulette { bet: 10, choice: "red".parse().unwrap() };
        let reply = eco.execute("ivy", cmd).unwrap();
        let delta = reply.profile.wallet - wallet;
        assert!(delta == 10 || delta == -10, "roulette moved {delta}");
        wallet = reply.profile.wallet;

        let reply = eco.execute("ivy", PlayerCommand::Blackjack { bet: 10 }).unwrap();
        let delta = reply.profile.wallet - wallet;
        assert!([-10, 0, 10].contains(&delta), "blackjack moved {delta}");
        wallet = reply.profile.wallet;
    }
}

/// Crime fines are capped at the wallet, so a broke criminal ends at zero.
#[test]
fn crime_fines_never_overdraw() {
    let (eco, _) = build(5);
    let mut p = eco.execute("jo", PlayerCommand::Start).unwrap().profile;
    p.wallet = 0;
    eco.put_profile("jo", p).unwrap();

    for _ in 0..40 {
        let reply = eco.execute("jo", PlayerCommand::Crime { kind: CrimeKind::Store }).unwrap();
        assert!(reply.profile.wallet >= 0);
    }
}

#[test]
fn submit_runs_queued_commands() {
    let (eco, _) = build(1);
    let queued = QueuedCommand::new("kim", PlayerCommand::Deposit { amount: 5 });
    assert_eq!(queued.command_id.len(), 36, "uuid v4 string");
    let reply = eco.submit(queued).unwrap();
    assert_eq!(reply.profile.bank, 5);
}

/// Commands decode from the JSON-lines form the runner reads.
#[test]
fn commands_parse_from_json_lines() {
    let cmd: PlayerCommand =
        serde_json::from_str(r#"{"cmd":"roulette","bet":50,"choice":"black"}"#).unwrap();
    assert_eq!(cmd.name(), "roulette");
    let cmd: PlayerCommand = serde_json::from_str(r#"{"cmd":"shop_buy","key":"laptop"}"#).unwrap();
    assert_eq!(cmd, PlayerCommand::ShopBuy { key: "laptop".into() });
    assert!(serde_json::from_str::<PlayerCommand>(r#"{"cmd":"roulette","bet":5,"choice":"green"}"#).is_err());
}
