use crate::models::{Notification, PushPayload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use tokio::{fs, sync::Mutex};
use tracing::{info, warn};

/// Bump this string to invalidate every previously cached asset; activation
/// deletes all buckets carrying any other name.
pub const CACHE_NAME: &str = "mcas-tracker-cache-v1";

/// App shell manifest, precached verbatim at install time.
pub const APP_SHELL_URLS: &[&str] = &["/", "/index.html", "/app.js", "/manifest.json"];

/// Document substituted for navigation requests that cannot be fetched.
const SHELL_DOCUMENT: &str = "/index.html";

/// Tag an external producer would register for background sync.
pub const SYNC_TAG: &str = "sync-new-logs";

#[derive(Debug, Clone)]
pub struct Asset {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("asset not found at origin: {0}")]
    NotFound(String),
    #[error("origin unreachable: {0}")]
    Unreachable(#[source] std::io::Error),
    #[error("cross-origin request not served locally: {0}")]
    CrossOrigin(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to precache {url}: {source}")]
    Install {
        url: String,
        #[source]
        source: OriginError,
    },
    #[error("cache bucket i/o failed: {0}")]
    Bucket(#[from] std::io::Error),
    #[error("cache index encode failed: {0}")]
    Index(#[from] serde_json::Error),
}

/// The "network" the cache fronts: a directory of shell assets. Removing a
/// file (or the whole root) is how tests and operators take the origin
/// offline.
#[derive(Debug, Clone)]
pub struct DirOrigin {
    root: PathBuf,
}

impl DirOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn fetch(&self, url: &str) -> Result<Asset, OriginError> {
        if !url.starts_with('/') {
            return Err(OriginError::CrossOrigin(url.to_string()));
        }
        let relative = match url_path(url) {
            "/" => "index.html",
            path => path.trim_start_matches('/'),
        };
        match fs::read(self.root.join(relative)).await {
            Ok(body) => Ok(Asset {
                body,
                content_type: content_type_for(url).to_string(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(OriginError::NotFound(url.to_string()))
            }
            Err(err) => Err(OriginError::Unreachable(err)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    file: String,
    content_type: String,
}

/// Versioned on-disk cache bucket plus its origin. All bucket writes go
/// through the index lock, so concurrent fetch handling stays serialized
/// the way the platform cache would be.
pub struct AssetCache {
    origin: DirOrigin,
    dir: PathBuf,
    name: String,
    index: Mutex<BTreeMap<String, EntryMeta>>,
}

impl AssetCache {
    /// Opens (or creates) the bucket named `name` under `dir`, loading any
    /// index left by a previous run.
    pub async fn open(
        origin: DirOrigin,
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Result<Self, CacheError> {
        let dir = dir.into();
        let name = name.into();
        let index_path = dir.join(&name).join("index.json");
        let index = match fs::read(&index_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(CacheError::Bucket(err)),
        };
        Ok(Self {
            origin,
            dir,
            name,
            index: Mutex::new(index),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn bucket(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Precaches the shell manifest. Every asset is fetched before anything
    /// is written, so a failed install leaves the existing bucket as it was.
    pub async fn install(&self) -> Result<(), CacheError> {
        let mut fetched = Vec::with_capacity(APP_SHELL_URLS.len());
        for url in APP_SHELL_URLS {
            let asset = self
                .origin
                .fetch(url)
                .await
                .map_err(|source| CacheError::Install {
                    url: url.to_string(),
                    source,
                })?;
            fetched.push((*url, asset));
        }
        for (url, asset) in &fetched {
            self.put(url, asset).await?;
        }
        info!(bucket = %self.name, assets = fetched.len(), "app shell precached");
        Ok(())
    }

    /// Deletes every sibling bucket whose name differs from the current one.
    pub async fn activate(&self) -> Result<(), CacheError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(CacheError::Bucket(err)),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name() == OsStr::new(&self.name) {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                info!(bucket = %entry.file_name().to_string_lossy(), "deleting old cache bucket");
                fs::remove_dir_all(entry.path()).await?;
            }
        }
        Ok(())
    }

    pub async fn put(&self, url: &str, asset: &Asset) -> Result<(), CacheError> {
        let mut index = self.index.lock().await;
        fs::create_dir_all(self.bucket()).await?;
        let file = entry_file(url);
        fs::write(self.bucket().join(&file), &asset.body).await?;
        index.insert(
            url.to_string(),
            EntryMeta {
                file,
                content_type: asset.content_type.clone(),
            },
        );
        let payload = serde_json::to_vec_pretty(&*index)?;
        fs::write(self.bucket().join("index.json"), payload).await?;
        Ok(())
    }

    pub async fn lookup(&self, url: &str) -> Option<Asset> {
        let meta = {
            let index = self.index.lock().await;
            index.get(url).cloned()
        }?;
        let body = fs::read(self.bucket().join(&meta.file)).await.ok()?;
        Some(Asset {
            body,
            content_type: meta.content_type,
        })
    }

    /// The per-request strategy: cache-first everywhere; navigations that
    /// miss both cache and origin fall back to the shell document, other
    /// misses yield nothing. Successful same-origin responses are cached
    /// on the way through.
    pub async fn handle(&self, url: &str, navigation: bool) -> Option<Asset> {
        if let Some(asset) = self.lookup(url).await {
            return Some(asset);
        }

        match self.origin.fetch(url).await {
            Ok(asset) => {
                if url.starts_with('/') && !navigation {
                    if let Err(err) = self.put(url, &asset).await {
                        warn!(%url, error = %err, "could not cache fetched asset");
                    }
                }
                Some(asset)
            }
            Err(err) if navigation => {
                warn!(%url, error = %err, "navigation fetch failed, serving cached shell");
                self.lookup(SHELL_DOCUMENT).await
            }
            Err(err) => {
                warn!(%url, error = %err, "fetch failed with no cache entry");
                None
            }
        }
    }
}

/// Background sync scaffolding: there is no backend to sync with, so the
/// handler only records that it ran.
pub fn on_sync(tag: &str) {
    if tag == SYNC_TAG {
        info!("background sync requested; all records are local-only, nothing to do");
    } else {
        info!(%tag, "ignoring unknown sync tag");
    }
}

/// Fills push payload gaps with the fixed reminder defaults; a click on the
/// resulting notification opens `url`.
pub fn resolve_push(payload: PushPayload) -> Notification {
    Notification {
        title: payload
            .title
            .unwrap_or_else(|| "MCAS Tracker Reminder".to_string()),
        body: payload
            .body
            .unwrap_or_else(|| "Time to log your symptoms or medication!".to_string()),
        url: payload.url.unwrap_or_else(|| "/".to_string()),
    }
}

fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn entry_file(url: &str) -> String {
    url.replace('/', "%2F")
}

fn content_type_for(url: &str) -> &'static str {
    let path = url_path(url);
    if path == "/" || path.ends_with(".html") {
        "text/html; charset=utf-8"
    } else if path.ends_with(".js") {
        "text/javascript; charset=utf-8"
    } else if path.ends_with(".json") {
        "application/json"
    } else if path.ends_with(".css") {
        "text/css; charset=utf-8"
    } else if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "application/octet-stream"
    }
}
