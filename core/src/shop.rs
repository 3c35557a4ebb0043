use crate::{
    catalog::{ShopCatalog, ShopItem},
    effect::{self, EffectKind},
    error::{EconError, EconResult},
    event::LedgerEvent,
    profile::Profile,
    types::Timestamp,
};
use chrono::Duration;

/// Buy `key` from the catalog: cosmetics go to the inventory, effect items
/// go to the effect registry (replacing any running effect of that kind).
pub fn buy(
    profile: &mut Profile,
    catalog: &ShopCatalog,
    key: &str,
    now: Timestamp,
) -> EconResult<Vec<LedgerEvent>> {
    let item = catalog
        .find(key)
        .ok_or_else(|| EconError::InvalidItemKey { key: key.to_string() })?;
    let grant = effect_parameters(item, now)?;

    profile.debit_wallet(item.price)?;
    let mut out = vec![LedgerEvent::ItemPurchased {
        key:   item.key.clone(),
        name:  item.name.clone(),
        price: item.price,
    }];

    match grant {
        None => profile.inventory.push(item.name.clone()),
        Some((kind, duration, percent)) => {
            let granted = effect::grant(profile, kind, duration, percent, now)?;
            out.push(LedgerEvent::EffectGranted {
                kind,
                percent:    granted.percent,
                expires_at: granted.expires_at,
            });
        }
    }
    Ok(out)
}

/// Validate an item's effect fields before any money moves.
fn effect_parameters(
    item: &ShopItem,
    now: Timestamp,
) -> EconResult<Option<(EffectKind, Duration, Option<u32>)>> {
    let Some(kind) = item.item_type.effect_kind() else {
        return Ok(None);
    };
    let invalid = |reason: &str| EconError::InvalidCatalog {
        key:    item.key.clone(),
        reason: reason.to_string(),
    };
    let hours = match item.duration_hours {
        Some(h) if h > 0 => h,
        _ => return Err(invalid("effect items need a positive duration_hours")),
    };
    if kind.takes_percent() && item.percent.is_none() {
        return Err(invalid("boost items need a percent"));
    }
    let duration = Duration::try_hours(hours)
        .filter(|d| now.checked_add_signed(*d).is_some())
        .ok_or_else(|| invalid("duration_hours is out of range"))?;
    Ok(Some((kind, duration, item.percent)))
}
