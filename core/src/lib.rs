//! casino-core: a persistent per-user coin ledger for a chat-platform
//! casino. Wallets, banks, jobs and timed effects accrue lazily against
//! wall-clock time and are brought up to date by reconciliation.

pub mod accrual_subsystem;
pub mod bank;
pub mod casino;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod cooldown;
pub mod effect;
pub mod engine;
pub mod error;
pub mod event;
pub mod expiry_subsystem;
pub mod job_offers;
pub mod lottery;
pub mod profile;
pub mod rng;
pub mod shop;
pub mod store;
pub mod subsystem;
pub mod types;
