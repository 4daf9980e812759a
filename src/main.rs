use mcas_tracker::cache::{AssetCache, CACHE_NAME, DirOrigin};
use mcas_tracker::state::AppState;
use mcas_tracker::store::TrackerData;
use mcas_tracker::{app, storage, ui};
use std::{env, net::SocketAddr};
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let data_path = storage::resolve_data_path();
    if let Some(parent) = data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let data = match storage::load_data(&data_path).await {
        Ok(data) => data,
        Err(err) => {
            // Same policy as every other storage failure: notify once and
            // keep the page usable, here with an empty in-memory database.
            // The unreadable file is set aside first so the next persist
            // cannot overwrite the records it still holds.
            error!("local database unavailable, starting empty: {err}");
            match storage::quarantine_data(&data_path).await {
                Ok(kept) => info!("unreadable data file kept at {}", kept.display()),
                Err(err) => error!("could not set aside unreadable data file: {err}"),
            }
            TrackerData::default()
        }
    };

    let asset_root = storage::resolve_asset_root();
    ui::seed_assets(&asset_root).await?;

    let cache = AssetCache::open(
        DirOrigin::new(&asset_root),
        storage::resolve_cache_dir(),
        CACHE_NAME,
    )
    .await?;
    // A failed install is logged and left alone; whatever bucket state
    // existed before keeps serving, mirroring a worker that never activates.
    if let Err(err) = cache.install().await {
        error!("app shell precache failed: {err}");
    } else if let Err(err) = cache.activate().await {
        error!("cache activation failed: {err}");
    }

    let state = AppState::new(data_path, data, cache);
    let app = app::router(state);

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
