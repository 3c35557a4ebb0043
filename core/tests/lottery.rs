//! Lottery tests: ticket sales, the draw schedule, and payout.

use casino_core::{
    clock::ManualClock,
    command::PlayerCommand,
    engine::{Economy, LOTTERY_SWEEP_ID},
    error::EconError,
    event::LedgerEvent,
    types::Timestamp,
};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

// ── Test helpers ────────────────────────────────────────────────────────────

fn t0() -> Timestamp {
    NaiveDate::from_ymd_opt(2025, 2, 14).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn build(seed: u64) -> (Economy, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    (Economy::build_test(seed, clock.clone()), clock)
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Each ticket adds its price to the jackpot.
#[test]
fn tickets_grow_the_jackpot() {
    let (eco, _) = build(8);
    eco.execute("ann", PlayerCommand::LotteryBuy).unwrap();
    let reply = eco.execute("ben", PlayerCommand::LotteryBuy).unwrap();

    assert_eq!(reply.profile.wallet, 900);
    let state = eco.lottery_state();
    assert_eq!(state.jackpot, 1200);
    assert_eq!(state.tickets.len(), 2);
}

#[test]
fn failed_purchase_adds_no_ticket() {
    let (eco, _) = build(8);
    let mut broke = eco.execute("ann", PlayerCommand::Start).unwrap().profile;
    broke.wallet = 99;
    eco.put_profile("ann", broke).unwrap();

    let err = eco.execute("ann", PlayerCommand::LotteryBuy).unwrap_err();
    assert!(matches!(err, EconError::InsufficientFunds { needed: 100, available: 99 }));
    assert!(eco.lottery_state().tickets.is_empty());
    assert_eq!(eco.lottery_state().jackpot, 1000);
}

/// A draw request with no schedule starts one and reports the draw as not due.
#[test]
fn first_draw_request_only_starts_the_schedule() {
    let (eco, clock) = build(8);
    eco.execute("ann", PlayerCommand::LotteryBuy).unwrap();

    let err = eco.execute("ann", PlayerCommand::LotteryDraw).unwrap_err();
    assert!(matches!(err, EconError::LotteryNotDue { remaining_secs: 86_400 }), "got {err:?}");
    assert_eq!(eco.lottery_state().last_draw, Some(t0()));

    clock.advance(Duration::hours(23));
    let err = eco.execute("ann", PlayerCommand::LotteryDraw).unwrap_err();
    assert!(matches!(err, EconError::LotteryNotDue { remaining_secs: 3_600 }));
}

/// A due draw pays the whole pot to one ticket holder, then resets the pot to
/// the seed jackpot and clears the tickets.
#[test]
fn due_draw_pays_the_jackpot_and_resets() {
    let (eco, clock) = build(8);
    eco.execute("ann", PlayerCommand::LotteryDraw).unwrap_err();
    for user in ["ann", "ben", "cat"] {
        eco.execute(user, PlayerCommand::LotteryBuy).unwrap();
    }
    clock.advance(Duration::hours(24));

    let reply = eco.execute("ann", PlayerCommand::LotteryDraw).unwrap();
    let Some(LedgerEvent::LotteryDrawn { winner, jackpot, tickets }) = reply.events.first() else {
        panic!("expected a draw event first, got {:?}", reply.events);
    };
    assert_eq!((*jackpot, *tickets), (1300, 3));
    assert_eq!(eco.profile(winner).unwrap().wallet, 900 + 1300);

    let state = eco.lottery_state();
    assert_eq!(state.jackpot, 1000);
    assert!(state.tickets.is_empty());
    assert_eq!(state.last_draw, Some(t0() + Duration::hours(24)));
}

#[test]
fn due_draw_without_tickets_is_an_error() {
    let (eco, clock) = build(8);
    eco.execute("ann", PlayerCommand::LotteryDraw).unwrap_err();
    clock.advance(Duration::hours(25));

    let err = eco.execute("ann", PlayerCommand::LotteryDraw).unwrap_err();
    assert!(matches!(err, EconError::NoLotteryTickets));
}

/// The periodic sweep runs the draw once the interval has passed.
#[test]
fn sweep_draws_automatically_when_due() {
    let (eco, clock) = build(8);
    eco.sweep().unwrap();
    eco.execute("ann", PlayerCommand::LotteryBuy).unwrap();

    clock.advance(Duration::hours(12));
    assert!(eco.sweep().unwrap().lottery.is_none());

    clock.advance(Duration::hours(12));
    let draw = eco.sweep().unwrap().lottery.expect("draw is due");
    assert_eq!(draw.winner, "ann");
    assert_eq!(draw.jackpot, 1100);
    assert_eq!(eco.profile("ann").unwrap().wallet, 900 + 1100);
}

/// A draw whose payout would overflow the winner's wallet is reported in the
/// sweep's failures. The pot and its tickets are kept for a later draw.
#[test]
fn sweep_survives_a_draw_that_cannot_pay() {
    let (eco, clock) = build(8);
    eco.sweep().unwrap();
    let mut rich = eco.execute("ann", PlayerCommand::LotteryBuy).unwrap().profile;
    rich.wallet = i64::MAX - 10;
    eco.put_profile("ann", rich).unwrap();
    eco.execute("ben", PlayerCommand::Start).unwrap();

    clock.advance(Duration::hours(24));
    let report = eco.sweep().expect("sweep reports the failed draw instead of aborting");
    assert!(report.lottery.is_none());
    assert_eq!(report.profiles, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, LOTTERY_SWEEP_ID);

    let state = eco.lottery_state();
    assert_eq!((state.jackpot, state.tickets.len()), (1100, 1), "unpaid draw keeps the pot");
    assert_eq!(state.last_draw, Some(t0()));
    assert_eq!(eco.profile("ann").unwrap().wallet, i64::MAX - 10);
}
