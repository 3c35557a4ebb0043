//! Job and shop catalogs. Both persist as plain JSON arrays next to the
//! profile document and are created with these defaults when absent.

use crate::{
    effect::EffectKind,
    types::Coins,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub name:   String,
    /// Base coins per hour.
    pub income: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobCatalog {
    pub jobs: Vec<JobListing>,
}

impl JobCatalog {
    pub fn new(jobs: Vec<JobListing>) -> Self {
        Self { jobs }
    }

    pub fn find(&self, name: &str) -> Option<&JobListing> {
        self.jobs.iter().find(|j| j.name == name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for JobCatalog {
    fn default() -> Self {
        let jobs = [
            ("Baker", 150),
            ("Programmer", 300),
            ("Mechanic", 200),
            ("Streamer", 100),
            ("Teacher", 180),
            ("Pilot", 400),
            ("Designer", 220),
            ("Doctor", 260),
            ("Police", 210),
        ];
        Self::new(
            jobs.into_iter()
                .map(|(name, income)| JobListing { name: name.into(), income })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Cosmetic,
    Shield,
    JobBoost,
    LuckBoost,
    InterestBoost,
}

impl ItemType {
    /// The effect this item grants, or None for inventory items.
    pub fn effect_kind(&self) -> Option<EffectKind> {
        match self {
            Self::Cosmetic => None,
            Self::Shield => Some(EffectKind::Shield),
            Self::JobBoost => Some(EffectKind::JobBoost),
            Self::LuckBoost => Some(EffectKind::LuckBoost),
            Self::InterestBoost => Some(EffectKind::InterestBoost),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub key:   String,
    pub name:  String,
    pub price: Coins,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopCatalog {
    pub items: Vec<ShopItem>,
}

impl ShopCatalog {
    pub fn new(items: Vec<ShopItem>) -> Self {
        Self { items }
    }

    /// Keys match case-insensitively.
    pub fn find(&self, key: &str) -> Option<&ShopItem> {
        self.items.iter().find(|i| i.key.eq_ignore_ascii_case(key))
    }
}

impl Default for ShopCatalog {
    fn default() -> Self {
        let item = |key: &str, name: &str, price, item_type, percent, duration_hours| ShopItem {
            key: key.into(),
            name: name.into(),
            price,
            item_type,
            percent,
            duration_hours,
        };
        Self::new(vec![
            item("watch", "Watch", 50, ItemType::Cosmetic, None, None),
            item("necklace", "Necklace", 100, ItemType::Cosmetic, None, None),
            item("laptop", "Laptop", 300, ItemType::Cosmetic, None, None),
            item("shield", "Shield", 500, ItemType::Shield, None, Some(24)),
            item("job_boost", "Job Boost", 400, ItemType::JobBoost, Some(25), Some(12)),
            item("luck_boost", "Lucky Charm", 300, ItemType::LuckBoost, Some(10), Some(6)),
            item("interest_boost", "Interest Boost", 600, ItemType::InterestBoost, Some(1), Some(24)),
        ])
    }
}
