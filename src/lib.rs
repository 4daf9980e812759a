pub mod app;
pub mod cache;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod ui;

pub use app::router;
pub use cache::{AssetCache, CACHE_NAME, DirOrigin};
pub use state::AppState;
pub use storage::{load_data, resolve_asset_root, resolve_cache_dir, resolve_data_path};
pub use store::TrackerData;
