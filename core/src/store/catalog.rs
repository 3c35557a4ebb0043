use super::write_json_atomic;
use crate::{
    catalog::{JobCatalog, ShopCatalog},
    error::{EconError, EconResult},
};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io;
use std::path::Path;

pub const JOBS_FILE: &str = "jobs.json";
pub const SHOP_FILE: &str = "shop.json";

pub fn load_or_create_jobs(data_dir: &Path) -> EconResult<JobCatalog> {
    load_or_create(&data_dir.join(JOBS_FILE))
}

pub fn load_or_create_shop(data_dir: &Path) -> EconResult<ShopCatalog> {
    load_or_create(&data_dir.join(SHOP_FILE))
}

/// Catalogs are operator-edited, so a file that fails to parse is an
/// error rather than something to silently replace.
fn load_or_create<T>(path: &Path) -> EconResult<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).map_err(|e| EconError::CorruptPersistedState {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let value = T::default();
            write_json_atomic(path, &value)?;
            log::info!("store: wrote default catalog {}", path.display());
            Ok(value)
        }
        Err(e) => Err(e.into()),
    }
}
