//! JSON document persistence.
//!
//! RULE: Only the store module touches the filesystem.
//! Callers read a whole Profile, mutate it in memory, and hand the whole
//! record back; there is no partial-field update API.
//!
//! Every write replaces the whole file atomically (write `<file>.tmp`,
//! then rename over the target), so a crash mid-write leaves the previous
//! document intact.

mod catalog;
mod lottery;
pub mod migrate;

pub use catalog::{load_or_create_jobs, load_or_create_shop, JOBS_FILE, SHOP_FILE};
pub use lottery::{LotteryStore, LOTTERY_FILE};

use crate::{
    error::{EconError, EconResult},
    profile::Profile,
    types::{Coins, Timestamp, UserId},
};
use migrate::{normalize_profile, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DATA_FILE: &str = "data.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(with = "crate::clock::iso")]
    pub created_at:     Timestamp,
    pub schema_version: u32,
    #[serde(flatten)]
    pub extra:          BTreeMap<String, Value>,
}

/// The whole persisted document: `{ users: {...}, meta: {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub users: BTreeMap<UserId, Profile>,
    pub meta:  Meta,
}

impl Document {
    pub fn empty(now: Timestamp) -> Self {
        Self {
            users: BTreeMap::new(),
            meta: Meta {
                created_at: now,
                schema_version: SCHEMA_VERSION,
                extra: BTreeMap::new(),
            },
        }
    }

    /// Parse and normalise raw file contents. Any failure is a reason to
    /// treat the file as corrupt.
    pub fn parse(text: &str, now: Timestamp) -> Result<Self, String> {
        let mut root: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let root_map = root.as_object_mut().ok_or("document root is not an object")?;

        let mut meta = match root_map.remove("meta") {
            Some(Value::Object(m)) => m,
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(_) => return Err("meta is not an object".into()),
        };
        let from_version = meta
            .get("schema_version")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        let created_at = meta
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(crate::clock::parse_timestamp)
            .unwrap_or(now);
        meta.insert("created_at".into(), Value::String(crate::clock::format_timestamp(&created_at)));
        meta.insert("schema_version".into(), Value::from(SCHEMA_VERSION));

        let raw_users = match root_map.remove("users") {
            Some(Value::Object(u)) => u,
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(_) => return Err("users is not an object".into()),
        };

        let mut users = BTreeMap::new();
        let mut repairs = 0;
        for (user_id, raw) in raw_users {
            let Value::Object(mut fields) = raw else {
                return Err(format!("profile {user_id} is not an object"));
            };
            repairs += normalize_profile(&user_id, &mut fields, from_version, now);
            let profile: Profile = serde_json::from_value(Value::Object(fields))
                .map_err(|e| format!("profile {user_id}: {e}"))?;
            users.insert(user_id, profile);
        }

        let meta: Meta = serde_json::from_value(Value::Object(meta)).map_err(|e| e.to_string())?;
        if from_version < SCHEMA_VERSION || repairs > 0 {
            log::info!(
                "store: normalised {} profiles from schema v{from_version} to v{SCHEMA_VERSION} ({repairs} repairs)",
                users.len()
            );
        }
        Ok(Self { users, meta })
    }
}

pub struct ProfileStore {
    doc:              Document,
    path:             Option<PathBuf>, // None for in-memory
    recovered_backup: Option<PathBuf>,
}

impl ProfileStore {
    /// Open (or create) the document at `path`. A corrupt document is
    /// moved aside to `<file>.backup-<unix seconds>` and replaced by an
    /// empty one; see `recovered_backup()`.
    pub fn open(path: impl Into<PathBuf>, now: Timestamp) -> EconResult<Self> {
        let path = path.into();
        let mut recovered_backup = None;

        let doc = match fs::read_to_string(&path) {
            Ok(text) => match Document::parse(&text, now) {
                Ok(doc) => doc,
                Err(reason) => {
                    let err = EconError::CorruptPersistedState {
                        path: path.display().to_string(),
                        reason,
                    };
                    let backup = move_aside(&path, now)?;
                    log::error!("{err}; moved to {} and reinitialised", backup.display());
                    recovered_backup = Some(backup);
                    Document::empty(now)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("store: creating {}", path.display());
                Document::empty(now)
            }
            Err(e) => return Err(e.into()),
        };

        let store = Self { doc, path: Some(path), recovered_backup };
        store.save()?;
        Ok(store)
    }

    /// A store with no backing file (used in tests).
    pub fn in_memory(now: Timestamp) -> Self {
        Self {
            doc: Document::empty(now),
            path: None,
            recovered_backup: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Where a corrupt document was moved by `open`, if that happened.
    pub fn recovered_backup(&self) -> Option<&Path> {
        self.recovered_backup.as_deref()
    }

    pub fn meta(&self) -> &Meta {
        &self.doc.meta
    }

    pub fn get(&self, user_id: &str) -> Option<&Profile> {
        self.doc.users.get(user_id)
    }

    /// Fetch a copy of the profile, inserting a fresh one if absent. The
    /// bool is true when the profile was just created. Creation is held in
    /// memory until the next `put`/`save`.
    pub fn get_or_create(
        &mut self,
        user_id: &str,
        starting_wallet: Coins,
        now: Timestamp,
    ) -> (Profile, bool) {
        let mut created = false;
        let profile = self
            .doc
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| {
                created = true;
                Profile::new(starting_wallet, now)
            })
            .clone();
        (profile, created)
    }

    /// Replace one profile and persist the full document. On a failed
    /// write the in-memory document is rolled back.
    pub fn put(&mut self, user_id: &str, profile: Profile) -> EconResult<()> {
        self.put_all([(user_id.to_string(), profile)])
    }

    /// Replace several profiles with a single write.
    pub fn put_all(&mut self, entries: impl IntoIterator<Item = (UserId, Profile)>) -> EconResult<()> {
        let mut previous = Vec::new();
        for (user_id, profile) in entries {
            let old = self.doc.users.insert(user_id.clone(), profile);
            previous.push((user_id, old));
        }
        if let Err(e) = self.save() {
            for (user_id, old) in previous.into_iter().rev() {
                match old {
                    Some(p) => self.doc.users.insert(user_id, p),
                    None => self.doc.users.remove(&user_id),
                };
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        self.doc.users.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.doc.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.users.is_empty()
    }

    pub fn save(&self) -> EconResult<()> {
        match &self.path {
            Some(path) => write_json_atomic(path, &self.doc),
            None => Ok(()),
        }
    }
}

/// Serialise `value` to `<path>.tmp`, flush it to disk, then rename over
/// `path`.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> EconResult<()> {
    let tmp = sibling(path, ".tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Rename a corrupt file to `<path>.backup-<unix seconds>[-n]`.
pub(crate) fn move_aside(path: &Path, now: Timestamp) -> EconResult<PathBuf> {
    let stamp = now.and_utc().timestamp();
    let mut backup = sibling(path, &format!(".backup-{stamp}"));
    let mut n = 1;
    while backup.exists() {
        backup = sibling(path, &format!(".backup-{stamp}-{n}"));
        n += 1;
    }
    fs::rename(path, &backup)?;
    Ok(backup)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
