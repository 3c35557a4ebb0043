use crate::types::Coins;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "economy.json";

/// Upper bound on any configured time span (100 years).
pub const MAX_SPAN_HOURS: i64 = 876_000;

/// Inclusive integer band for a uniform draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoinBand {
    pub min: Coins,
    pub max: Coins,
}

impl CoinBand {
    pub const fn new(min: Coins, max: Coins) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccrualConfig {
    /// Base bank interest per elapsed hour (0.01 = 1%).
    pub bank_interest_per_hour: f64,
    /// Seconds between background sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            bank_interest_per_hour: 0.01,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOfferConfig {
    pub offer_count: usize,
    pub offer_ttl_minutes: i64,
}

impl Default for JobOfferConfig {
    fn default() -> Self {
        Self {
            offer_count: 3,
            offer_ttl_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobConfig {
    pub cooldown_minutes: i64,
    pub success_chance: f64,
    /// Loot taken from the target on success, capped at the target's wallet.
    pub loot: CoinBand,
    /// Fine paid by the robber on failure, capped at the robber's wallet.
    pub fine: CoinBand,
}

impl Default for RobConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: 60,
            success_chance: 0.5,
            loot: CoinBand::new(100, 500),
            fine: CoinBand::new(50, 150),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeBands {
    pub reward: CoinBand,
    pub fine: CoinBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrimeConfig {
    pub success_chance: f64,
    pub store: CrimeBands,
    pub scam: CrimeBands,
}

impl Default for CrimeConfig {
    fn default() -> Self {
        Self {
            success_chance: 0.5,
            store: CrimeBands {
                reward: CoinBand::new(100, 500),
                fine: CoinBand::new(50, 150),
            },
            scam: CrimeBands {
                reward: CoinBand::new(50, 300),
                fine: CoinBand::new(25, 100),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub ticket_price: Coins,
    /// Jackpot after each draw, before any ticket is sold.
    pub seed_jackpot: Coins,
    pub draw_interval_hours: i64,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            ticket_price: 100,
            seed_jackpot: 1_000,
            draw_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub starting_wallet: Coins,
    pub accrual: AccrualConfig,
    pub jobs: JobOfferConfig,
    pub rob: RobConfig,
    pub crime: CrimeConfig,
    pub lottery: LotteryConfig,
    /// Upper bound on any luck-adjusted win probability.
    pub luck_cap: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_wallet: 1_000,
            accrual: AccrualConfig::default(),
            jobs: JobOfferConfig::default(),
            rob: RobConfig::default(),
            crime: CrimeConfig::default(),
            lottery: LotteryConfig::default(),
            luck_cap: 0.95,
        }
    }
}

impl EconomyConfig {
    /// Load `<data_dir>/economy.json`, falling back to defaults when the
    /// file does not exist. In tests, use EconomyConfig::default_test().
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            log::info!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Cannot parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.starting_wallet < 0 {
            bail!("starting_wallet must be non-negative");
        }
        let rate = self.accrual.bank_interest_per_hour;
        if !rate.is_finite() || rate < 0.0 {
            bail!("accrual.bank_interest_per_hour must be non-negative");
        }
        if self.accrual.sweep_interval_secs == 0 {
            bail!("accrual.sweep_interval_secs must be positive");
        }
        if !(1..=MAX_SPAN_HOURS * 60).contains(&self.jobs.offer_ttl_minutes) {
            bail!("jobs.offer_ttl_minutes must be within [1, {}]", MAX_SPAN_HOURS * 60);
        }
        if !(0..=MAX_SPAN_HOURS * 60).contains(&self.rob.cooldown_minutes) {
            bail!("rob.cooldown_minutes must be within [0, {}]", MAX_SPAN_HOURS * 60);
        }
        if self.lottery.ticket_price <= 0 || self.lottery.seed_jackpot < 0 {
            bail!("lottery.ticket_price must be positive and seed_jackpot non-negative");
        }
        if !(1..=MAX_SPAN_HOURS).contains(&self.lottery.draw_interval_hours) {
            bail!("lottery.draw_interval_hours must be within [1, {MAX_SPAN_HOURS}]");
        }
        for (label, p) in [
            ("rob.success_chance", self.rob.success_chance),
            ("crime.success_chance", self.crime.success_chance),
            ("luck_cap", self.luck_cap),
        ] {
            if !(0.0..=1.0).contains(&p) {
                bail!("{label} must be within [0, 1] (got {p})");
            }
        }
        for (label, band) in [
            ("rob.loot", self.rob.loot),
            ("rob.fine", self.rob.fine),
            ("crime.store.reward", self.crime.store.reward),
            ("crime.store.fine", self.crime.store.fine),
            ("crime.scam.reward", self.crime.scam.reward),
            ("crime.scam.fine", self.crime.scam.fine),
        ] {
            if band.min < 0 || band.min > band.max {
                bail!("{label} must satisfy 0 <= min <= max (got {}..={})", band.min, band.max);
            }
        }
        Ok(())
    }
}
