//! The Economy service: the single owner of every piece of ledger state.
//!
//! EXECUTION ORDER for one command (fixed, never reordered):
//!   1. get_or_create the profile(s) involved
//!   2. run every sweep subsystem on a working copy (accrual, then expiry)
//!   3. apply the command to the working copy
//!   4. persist the whole profile(s) in one write
//!
//! RULES:
//!   - All state lives behind one Mutex; a command holds it from read to write.
//!   - Commands mutate copies. A failed command persists only step 2, so
//!     income earned up to the failure is never lost and never paid twice.
//!   - All randomness flows through the RngStreams seeded at construction.
//!   - Every committed change is reported as LedgerEvents and logged.

use crate::{
    accrual_subsystem::AccrualSubsystem,
    bank,
    casino::{self, RouletteChoice},
    catalog::{JobCatalog, ShopCatalog},
    clock::{self, Clock, ManualClock},
    command::{PlayerCommand, QueuedCommand},
    config::EconomyConfig,
    error::{EconError, EconResult},
    event::LedgerEvent,
    expiry_subsystem::ExpirySubsystem,
    job_offers,
    lottery::{DrawResult, LotteryState},
    profile::Profile,
    rng::{RngBank, RngStreams},
    shop,
    store::{self, LotteryStore, ProfileStore},
    subsystem::SweepSubsystem,
    types::{Timestamp, UserId},
};
use chrono::Duration;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// `SweepReport::failed` entry for a lottery draw that could not settle.
pub const LOTTERY_SWEEP_ID: &str = "<lottery>";

/// What a successful command hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    pub message: String,
    /// The caller's profile as persisted after the command.
    pub profile: Profile,
    pub events:  Vec<LedgerEvent>,
}

/// Outcome of one sweep over every profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub profiles: usize,
    pub updated:  usize,
    pub events:   usize,
    /// Profiles whose sweep failed, with the error text. Their stored
    /// records are left untouched. A failed lottery draw is listed under
    /// [`LOTTERY_SWEEP_ID`].
    pub failed:   Vec<(UserId, String)>,
    pub lottery:  Option<DrawResult>,
}

struct EconomyState {
    store:    ProfileStore,
    lottery:  LotteryStore,
    jobs:     JobCatalog,
    shop:     ShopCatalog,
    rngs:     RngStreams,
    sweepers: Vec<Box<dyn SweepSubsystem>>,
}

pub struct Economy {
    config: EconomyConfig,
    clock:  Arc<dyn Clock>,
    state:  Mutex<EconomyState>,
}

impl Economy {
    /// Open (or initialise) the data directory: profile document, job and
    /// shop catalogs, and lottery state.
    pub fn open(
        data_dir: &Path,
        config: EconomyConfig,
        seed: u64,
        clock: Arc<dyn Clock>,
    ) -> EconResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let now = clock.now();
        let state = EconomyState {
            store:    ProfileStore::open(data_dir.join(store::DATA_FILE), now)?,
            lottery:  LotteryStore::open(
                data_dir.join(store::LOTTERY_FILE),
                config.lottery.seed_jackpot,
                now,
            )?,
            jobs:     store::load_or_create_jobs(data_dir)?,
            shop:     store::load_or_create_shop(data_dir)?,
            rngs:     RngBank::new(seed).streams(),
            sweepers: Self::default_sweepers(&config),
        };
        log::info!(
            "economy: opened {} ({} profiles, {} jobs, {} shop items, seed {seed})",
            data_dir.display(),
            state.store.len(),
            state.jobs.len(),
            state.shop.items.len(),
        );
        Ok(Self::from_state(config, clock, state))
    }

    /// An economy with no backing files and the default catalogs.
    pub fn in_memory(config: EconomyConfig, seed: u64, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let state = EconomyState {
            store:    ProfileStore::in_memory(now),
            lottery:  LotteryStore::in_memory(config.lottery.seed_jackpot),
            jobs:     JobCatalog::default(),
            shop:     ShopCatalog::default(),
            rngs:     RngBank::new(seed).streams(),
            sweepers: Self::default_sweepers(&config),
        };
        Self::from_state(config, clock, state)
    }

    /// In-memory economy on test defaults, driven by a manual clock.
    pub fn build_test(seed: u64, clock: Arc<ManualClock>) -> Self {
        Self::in_memory(EconomyConfig::default_test(), seed, clock)
    }

    fn from_state(config: EconomyConfig, clock: Arc<dyn Clock>, state: EconomyState) -> Self {
        Self { config, clock, state: Mutex::new(state) }
    }

    /// Sweep subsystems in execution order. Accrual must run before expiry
    /// so boosts that lapsed mid-span are still honoured for their hours.
    fn default_sweepers(config: &EconomyConfig) -> Vec<Box<dyn SweepSubsystem>> {
        vec![
            Box::new(AccrualSubsystem::new(config.accrual.clone())),
            Box::new(ExpirySubsystem::new()),
        ]
    }

    fn lock(&self) -> MutexGuard<'_, EconomyState> {
        // Commits are whole-record, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Queries ───────────────────────────────────

    /// The stored profile, without reconciling it.
    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        self.lock().store.get(user_id).cloned()
    }

    pub fn profile_count(&self) -> usize {
        self.lock().store.len()
    }

    pub fn lottery_state(&self) -> LotteryState {
        self.lock().lottery.state.clone()
    }

    pub fn job_catalog(&self) -> JobCatalog {
        self.lock().jobs.clone()
    }

    pub fn shop_catalog(&self) -> ShopCatalog {
        self.lock().shop.clone()
    }

    /// Where a corrupt profile document was moved on open, if it was.
    pub fn recovered_backup(&self) -> Option<std::path::PathBuf> {
        self.lock().store.recovered_backup().map(Path::to_path_buf)
    }

    // ── Administration ────────────────────────────

    /// Replace a stored profile wholesale.
    pub fn put_profile(&self, user_id: &str, profile: Profile) -> EconResult<()> {
        self.lock().store.put(user_id, profile)
    }

    /// Swap the in-memory job catalog. Existing jobs keep their income.
    pub fn set_job_catalog(&self, jobs: JobCatalog) {
        self.lock().jobs = jobs;
    }

    pub fn set_shop_catalog(&self, shop: ShopCatalog) {
        self.lock().shop = shop;
    }

    // ── Commands ──────────────────────────────────

    pub fn submit(&self, queued: QueuedCommand) -> EconResult<CommandReply> {
        log::debug!(
            "[{}] {} <- {}",
            queued.command_id,
            queued.user_id,
            queued.command.name()
        );
        let result = self.execute(&queued.user_id, queued.command);
        if let Err(e) = &result {
            log::debug!("[{}] rejected: {e}", queued.command_id);
        }
        result
    }

    pub fn execute(&self, user_id: &str, command: PlayerCommand) -> EconResult<CommandReply> {
        let now = self.clock.now();
        let mut guard = self.lock();
        let state = &mut *guard;
        let config = &self.config;

        match command {
            PlayerCommand::Start | PlayerCommand::Stats => {
                with_profile(state, config, user_id, now, |_, p| Ok(p.to_string()))
            }
            PlayerCommand::Balance => with_profile(state, config, user_id, now, |_, p| {
                Ok(format!("Wallet: ${}\nBank: ${}", p.wallet, p.bank))
            }),
            PlayerCommand::Deposit { amount } => {
                with_profile(state, config, user_id, now, |ctx, p| {
                    ctx.events.push(bank::deposit(p, amount)?);
                    Ok(format!("Deposited ${amount} into your bank."))
                })
            }
            PlayerCommand::Withdraw { amount } => {
                with_profile(state, config, user_id, now, |ctx, p| {
                    ctx.events.push(bank::withdraw(p, amount)?);
                    Ok(format!("Withdrew ${amount} from your bank."))
                })
            }
            PlayerCommand::Jobs => with_profile(state, config, user_id, now, |ctx, p| {
                let ttl = clock::try_minutes(config.jobs.offer_ttl_minutes, "sizing the offer window")?;
                if let Some(event) = job_offers::make_offers(
                    p,
                    ctx.jobs,
                    config.jobs.offer_count,
                    ttl,
                    now,
                    &mut ctx.rngs.offers,
                )? {
                    ctx.events.push(event);
                }
                Ok(render_offers(p, ctx.jobs, now))
            }),
            PlayerCommand::Job { number } => with_profile(state, config, user_id, now, |ctx, p| {
                let event = job_offers::claim(p, number, ctx.jobs, now)?;
                let message = match &event {
                    LedgerEvent::JobClaimed { job, income } => {
                        format!("You are now a {job}, earning {income} coins/hour.")
                    }
                    _ => String::new(),
                };
                ctx.events.push(event);
                Ok(message)
            }),
            PlayerCommand::ShopList => with_profile(state, config, user_id, now, |ctx, _| {
                Ok(render_shop(ctx.shop))
            }),
            PlayerCommand::ShopBuy { key } => with_profile(state, config, user_id, now, |ctx, p| {
                let events = shop::buy(p, ctx.shop, &key, now)?;
                let message = match events.first() {
                    Some(LedgerEvent::ItemPurchased { name, price, .. }) => {
                        format!("You bought {name} for ${price}.")
                    }
                    _ => String::new(),
                };
                ctx.events.extend(events);
                Ok(message)
            }),
            PlayerCommand::Roulette { bet, choice } => {
                with_profile(state, config, user_id, now, |ctx, p| {
                    let outcome =
                        casino::roulette(p, bet, choice, now, config.luck_cap, &mut ctx.rngs.casino)?;
                    ctx.events.push(outcome.event);
                    Ok(render_roulette(choice, outcome.landed, outcome.won, bet))
                })
            }
            PlayerCommand::Blackjack { bet } => {
                with_profile(state, config, user_id, now, |ctx, p| {
                    let outcome = casino::blackjack(p, bet, now, config.luck_cap, &mut ctx.rngs.casino)?;
                    let verdict = match outcome.player.cmp(&outcome.dealer) {
                        std::cmp::Ordering::Greater => format!("You won ${bet}!"),
                        std::cmp::Ordering::Less => format!("You lost ${bet}."),
                        std::cmp::Ordering::Equal => "It's a tie. Your bet is returned.".to_string(),
                    };
                    ctx.events.push(outcome.event);
                    Ok(format!(
                        "You drew {}, dealer drew {}. {verdict}",
                        outcome.player, outcome.dealer
                    ))
                })
            }
            PlayerCommand::Crime { kind } => with_profile(state, config, user_id, now, |ctx, p| {
                let event =
                    casino::commit_crime(p, kind, &config.crime, now, config.luck_cap, &mut ctx.rngs.crime)?;
                let message = match &event {
                    LedgerEvent::CrimeCommitted { success: true, delta, .. } => {
                        format!("The {} paid off: +${delta}.", kind.name())
                    }
                    LedgerEvent::CrimeCommitted { delta, .. } => {
                        format!("You got caught and paid a ${} fine.", -delta)
                    }
                    _ => String::new(),
                };
                ctx.events.push(event);
                Ok(message)
            }),
            PlayerCommand::Rob { target } => rob(state, config, user_id, &target, now),
            PlayerCommand::LotteryBuy => {
                let EconomyState { store, lottery, jobs, shop, rngs, sweepers } = state;
                let parts = StateParts { store, jobs: &*jobs, shop: &*shop, rngs, sweepers: sweepers.as_slice() };
                let mut ticket = lottery.state.clone();
                let reply = with_profile_parts(parts, config, user_id, now, |ctx, p| {
                    ctx.events.push(ticket.buy_ticket(user_id, p, config.lottery.ticket_price)?);
                    Ok(format!(
                        "Ticket bought for ${}. Jackpot is now ${}.",
                        config.lottery.ticket_price, ticket.jackpot
                    ))
                })?;
                lottery.state = ticket;
                lottery.save()?;
                Ok(reply)
            }
            PlayerCommand::LotteryDraw => {
                let interval = lottery_interval(config)?;
                if state.lottery.state.ensure_schedule(now) {
                    state.lottery.save()?;
                }
                state.lottery.state.check_due(now, interval)?;
                let (draw, mut events) = draw_lottery(state, config, now)?;
                let mut reply = with_profile(state, config, user_id, now, |_, _| {
                    Ok(format!(
                        "{} won the ${} jackpot from {} tickets!",
                        draw.winner, draw.jackpot, draw.tickets
                    ))
                })?;
                events.append(&mut reply.events);
                reply.events = events;
                Ok(reply)
            }
        }
    }

    // ── Sweep ─────────────────────────────────────

    /// Reconcile every stored profile up to now and run the lottery draw if
    /// it is due. A failure on one profile is logged and that profile is
    /// skipped; all other results are written in a single save.
    pub fn sweep(&self) -> EconResult<SweepReport> {
        let now = self.clock.now();
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut report = SweepReport::default();
        let mut changed = Vec::new();

        for user_id in state.store.user_ids() {
            report.profiles += 1;
            let Some(stored) = state.store.get(&user_id) else { continue };
            let mut working = stored.clone();
            match run_sweepers(&state.sweepers, &mut working, now) {
                Ok(events) => {
                    if working != *stored {
                        log_events(&user_id, &events);
                        report.events += events.len();
                        changed.push((user_id, working));
                    }
                }
                Err(e) => {
                    log::warn!("sweep: skipping {user_id}: {e}");
                    report.failed.push((user_id, e.to_string()));
                }
            }
        }

        report.updated = changed.len();
        if !changed.is_empty() {
            state.store.put_all(changed)?;
        }

        let interval = lottery_interval(&self.config)?;
        if state.lottery.state.ensure_schedule(now) {
            state.lottery.save()?;
        }
        if !state.lottery.state.tickets.is_empty()
            && state.lottery.state.check_due(now, interval).is_ok()
        {
            match draw_lottery(state, &self.config, now) {
                Ok((draw, _)) => report.lottery = Some(draw),
                Err(e) => {
                    log::warn!("sweep: lottery draw failed, tickets kept: {e}");
                    report.failed.push((LOTTERY_SWEEP_ID.to_string(), e.to_string()));
                }
            }
        }

        log::debug!(
            "sweep: {} profiles, {} updated, {} failed",
            report.profiles,
            report.updated,
            report.failed.len()
        );
        Ok(report)
    }
}

// ── Command plumbing ──────────────────────────────

/// Everything a command closure may touch besides the profile itself.
struct CommandCtx<'a> {
    jobs:   &'a JobCatalog,
    shop:   &'a ShopCatalog,
    rngs:   &'a mut RngStreams,
    events: Vec<LedgerEvent>,
}

struct StateParts<'a> {
    store:    &'a mut ProfileStore,
    jobs:     &'a JobCatalog,
    shop:     &'a ShopCatalog,
    rngs:     &'a mut RngStreams,
    sweepers: &'a [Box<dyn SweepSubsystem>],
}

fn state_parts(state: &mut EconomyState) -> StateParts<'_> {
    StateParts {
        store:    &mut state.store,
        jobs:     &state.jobs,
        shop:     &state.shop,
        rngs:     &mut state.rngs,
        sweepers: &state.sweepers,
    }
}

fn with_profile<F>(
    state: &mut EconomyState,
    config: &EconomyConfig,
    user_id: &str,
    now: Timestamp,
    action: F,
) -> EconResult<CommandReply>
where
    F: FnOnce(&mut CommandCtx<'_>, &mut Profile) -> EconResult<String>,
{
    with_profile_parts(state_parts(state), config, user_id, now, action)
}

/// Load, reconcile, act, persist. See the module docs for the order.
fn with_profile_parts<F>(
    parts: StateParts<'_>,
    config: &EconomyConfig,
    user_id: &str,
    now: Timestamp,
    action: F,
) -> EconResult<CommandReply>
where
    F: FnOnce(&mut CommandCtx<'_>, &mut Profile) -> EconResult<String>,
{
    let StateParts { store, jobs, shop, rngs, sweepers } = parts;
    let (stored, created) = store.get_or_create(user_id, config.starting_wallet, now);

    let mut reconciled = stored.clone();
    let mut events = run_sweepers(sweepers, &mut reconciled, now)?;
    if created {
        events.insert(0, LedgerEvent::ProfileCreated { wallet: stored.wallet });
    }

    let mut working = reconciled.clone();
    let mut ctx = CommandCtx { jobs, shop, rngs, events: Vec::new() };
    match action(&mut ctx, &mut working) {
        Ok(message) => {
            store.put(user_id, working.clone())?;
            events.append(&mut ctx.events);
            log_events(user_id, &events);
            Ok(CommandReply { message, profile: working, events })
        }
        Err(e) => {
            if created || reconciled != stored {
                match store.put(user_id, reconciled) {
                    Ok(()) => log_events(user_id, &events),
                    Err(save_err) => log::warn!("{user_id}: could not persist reconciliation: {save_err}"),
                }
            }
            Err(e)
        }
    }
}

fn run_sweepers(
    sweepers: &[Box<dyn SweepSubsystem>],
    profile: &mut Profile,
    now: Timestamp,
) -> EconResult<Vec<LedgerEvent>> {
    let mut events = Vec::new();
    for sweeper in sweepers {
        let produced = sweeper.sweep_profile(profile, now)?;
        if !produced.is_empty() {
            log::debug!("{}: {} events", sweeper.name(), produced.len());
        }
        events.extend(produced);
    }
    Ok(events)
}

fn log_events(user_id: &str, events: &[LedgerEvent]) {
    for event in events {
        log::info!("{user_id}: {} {}", event.type_name(), payload(event));
    }
}

fn payload(event: &LedgerEvent) -> String {
    serde_json::to_string(event).unwrap_or_default()
}

fn lottery_interval(config: &EconomyConfig) -> EconResult<Duration> {
    clock::try_hours(config.lottery.draw_interval_hours, "sizing the lottery interval")
}

/// Player-vs-player rob. Both profiles are reconciled first and persisted
/// together.
fn rob(
    state: &mut EconomyState,
    config: &EconomyConfig,
    robber_id: &str,
    target_id: &str,
    now: Timestamp,
) -> EconResult<CommandReply> {
    if robber_id == target_id {
        return Err(EconError::SelfTargetNotAllowed);
    }
    let EconomyState { store, rngs, sweepers, .. } = state;
    if store.get(target_id).is_none() {
        return Err(EconError::UnknownTarget { target: target_id.to_string() });
    }

    let mut events = Vec::new();
    let mut stored = Vec::with_capacity(2);
    let mut reconciled = Vec::with_capacity(2);
    for id in [robber_id, target_id] {
        let (profile, created) = store.get_or_create(id, config.starting_wallet, now);
        let mut next = profile.clone();
        let produced = run_sweepers(sweepers, &mut next, now)?;
        if created {
            events.push((id, LedgerEvent::ProfileCreated { wallet: profile.wallet }));
        }
        events.extend(produced.into_iter().map(|e| (id, e)));
        stored.push((profile, created));
        reconciled.push(next);
    }

    let mut robber = reconciled[0].clone();
    let mut target = reconciled[1].clone();
    let result = casino::rob(
        robber_id,
        &mut robber,
        target_id,
        &mut target,
        &config.rob,
        now,
        config.luck_cap,
        &mut rngs.rob,
    );

    let ids = [robber_id.to_string(), target_id.to_string()];
    match result {
        Ok(event) => {
            store.put_all([(ids[0].clone(), robber.clone()), (ids[1].clone(), target)])?;
            events.push((robber_id, event.clone()));
            for (id, e) in &events {
                log_events(id, std::slice::from_ref(e));
            }
            let message = match &event {
                LedgerEvent::RobAttempted { success: true, amount, .. } => {
                    format!("You robbed {target_id} for ${amount}!")
                }
                LedgerEvent::RobAttempted { amount, .. } => {
                    format!("You were caught and fined ${amount}.")
                }
                _ => String::new(),
            };
            Ok(CommandReply {
                message,
                profile: robber,
                events: events.into_iter().filter(|(id, _)| *id == robber_id).map(|(_, e)| e).collect(),
            })
        }
        Err(e) => {
            let dirty: Vec<(UserId, Profile)> = ids
                .into_iter()
                .zip(stored.iter().zip(reconciled))
                .filter(|(_, ((before, created), after))| *created || before != after)
                .map(|(id, (_, after))| (id, after))
                .collect();
            if !dirty.is_empty() {
                if let Err(save_err) = store.put_all(dirty) {
                    log::warn!("rob: could not persist reconciliation: {save_err}");
                }
            }
            Err(e)
        }
    }
}

/// Draw the lottery and pay the winner. The lottery state only changes
/// once the winner's credit is persisted.
fn draw_lottery(
    state: &mut EconomyState,
    config: &EconomyConfig,
    now: Timestamp,
) -> EconResult<(DrawResult, Vec<LedgerEvent>)> {
    let mut next = state.lottery.state.clone();
    let draw = next.draw(now, config.lottery.seed_jackpot, &mut state.rngs.lottery)?;

    let jackpot = draw.jackpot;
    with_profile(state, config, &draw.winner, now, |_, p| {
        p.credit_wallet(jackpot)?;
        Ok(String::new())
    })?;

    state.lottery.state = next;
    state.lottery.save()?;

    let event = LedgerEvent::LotteryDrawn {
        winner:  draw.winner.clone(),
        jackpot: draw.jackpot,
        tickets: draw.tickets,
    };
    log_events(&draw.winner, std::slice::from_ref(&event));
    Ok((draw, vec![event]))
}

// ── Rendering ─────────────────────────────────────

fn render_offers(profile: &Profile, jobs: &JobCatalog, now: Timestamp) -> String {
    let minutes = profile
        .offers_expires
        .map(|exp| (exp - now).num_minutes().max(0))
        .unwrap_or(0);
    let mut out = format!("Job offers (expire in {minutes} min):");
    for (i, name) in profile.job_offers.iter().enumerate() {
        match jobs.find(name) {
            Some(listing) => out.push_str(&format!("\n{}. {name} - {} coins/hour", i + 1, listing.income)),
            None => out.push_str(&format!("\n{}. {name} - no longer available", i + 1)),
        }
    }
    out
}

fn render_shop(shop: &ShopCatalog) -> String {
    let mut out = String::from("Shop:");
    for item in &shop.items {
        out.push_str(&format!("\n{} ({}) - ${}", item.name, item.key, item.price));
        if let Some(kind) = item.item_type.effect_kind() {
            let hours = item.duration_hours.unwrap_or(0);
            match item.percent {
                Some(pct) if kind.takes_percent() => {
                    out.push_str(&format!(" [+{pct}% {}, {hours}h]", kind.name()))
                }
                _ => out.push_str(&format!(" [{}, {hours}h]", kind.name())),
            }
        }
    }
    out
}

fn render_roulette(choice: RouletteChoice, landed: RouletteChoice, won: bool, bet: i64) -> String {
    if won {
        format!("The wheel landed on {}. You bet {} and won ${bet}!", landed.label(), choice.label())
    } else {
        format!("The wheel landed on {}. You bet {} and lost ${bet}.", landed.label(), choice.label())
    }
}
