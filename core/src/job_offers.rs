//! Job offers: time-limited random selections from the job catalog, and
//! the claim that commits one of them as the profile's job.
//!
//! Lifecycle: none → offered (until offers_expires) → claimed | expired.
//! A claim clears the offers so the same selection cannot be claimed twice.

use crate::{
    catalog::JobCatalog,
    clock::checked_after,
    error::{EconError, EconResult},
    event::LedgerEvent,
    profile::Profile,
    rng::StreamRng,
    types::Timestamp,
};
use chrono::Duration;

pub fn offers_valid(profile: &Profile, now: Timestamp) -> bool {
    !profile.job_offers.is_empty() && profile.offers_expires.is_some_and(|exp| now < exp)
}

/// Issue fresh offers unless the current ones are still valid. Draws
/// `min(count, catalog.len())` distinct jobs. Returns an event only when
/// new offers were issued; fails only if the expiry is unrepresentable.
pub fn make_offers(
    profile: &mut Profile,
    catalog: &JobCatalog,
    count: usize,
    ttl: Duration,
    now: Timestamp,
    rng: &mut StreamRng,
) -> EconResult<Option<LedgerEvent>> {
    if offers_valid(profile, now) {
        return Ok(None);
    }
    let expires_at = checked_after(now, ttl, "scheduling job offers")?;

    let offers: Vec<String> = rng
        .sample_indices(catalog.len(), count)
        .into_iter()
        .map(|i| catalog.jobs[i].name.clone())
        .collect();
    profile.job_offers = offers.clone();
    profile.offers_expires = Some(expires_at);

    Ok(Some(LedgerEvent::OffersIssued { offers, expires_at }))
}

/// Commit offer number `index` (1-based) as the profile's job.
pub fn claim(
    profile: &mut Profile,
    index: usize,
    catalog: &JobCatalog,
    now: Timestamp,
) -> EconResult<LedgerEvent> {
    if !offers_valid(profile, now) {
        return Err(EconError::NoValidOffers);
    }
    let len = profile.job_offers.len();
    if index < 1 || index > len {
        return Err(EconError::InvalidIndex { index, len });
    }

    let name = &profile.job_offers[index - 1];
    let listing = catalog
        .find(name)
        .ok_or_else(|| EconError::JobRemoved { name: name.clone() })?
        .clone();

    profile.job = Some(listing.name.clone());
    profile.income = listing.income;
    profile.last_pay = now;
    profile.job_offers.clear();
    profile.offers_expires = None;

    Ok(LedgerEvent::JobClaimed {
        job:    listing.name,
        income: listing.income,
    })
}
