use crate::cache::AssetCache;
use crate::store::TrackerData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Application context built once at startup: the open data file, the
/// in-memory collections behind one serializing lock, and the asset cache.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<TrackerData>>,
    pub cache: Arc<AssetCache>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: TrackerData, cache: AssetCache) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            cache: Arc::new(cache),
        }
    }
}
