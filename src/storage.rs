use crate::errors::StoreError;
use crate::store::TrackerData;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;

pub fn resolve_data_path() -> PathBuf {
    match env::var("APP_DATA_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from("data/tracker.json"),
    }
}

/// Directory the shell assets are served (and cached) from.
pub fn resolve_asset_root() -> PathBuf {
    match env::var("ASSET_ROOT") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from("assets"),
    }
}

/// Directory holding the versioned cache buckets.
pub fn resolve_cache_dir() -> PathBuf {
    match env::var("CACHE_DIR") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from("data/cache"),
    }
}

/// Idempotent open: a missing file is a fresh database, anything else that
/// cannot be read or decoded is surfaced as a storage failure.
pub async fn load_data(path: &Path) -> Result<TrackerData, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(StoreError::Read),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(TrackerData::default()),
        Err(err) => Err(StoreError::Unavailable(err)),
    }
}

/// Renames a data file that exists but cannot be loaded, so a later
/// persist can never overwrite the records it still holds.
pub async fn quarantine_data(path: &Path) -> Result<PathBuf, StoreError> {
    let mut quarantined = path.as_os_str().to_os_string();
    quarantined.push(".corrupt");
    let quarantined = PathBuf::from(quarantined);
    fs::rename(path, &quarantined)
        .await
        .map_err(StoreError::Unavailable)?;
    Ok(quarantined)
}

pub async fn persist_data(path: &Path, data: &TrackerData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data).map_err(StoreError::Encode)?;
    fs::write(path, payload).await.map_err(StoreError::Write)?;
    Ok(())
}
