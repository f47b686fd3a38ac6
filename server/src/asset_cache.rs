use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::Context;
use axum::{body::Bytes, http::StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::upstream::{Upstream, UpstreamResponse};

#[derive(Debug, Clone, PartialEq)]
pub struct CachedAsset {
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Serialize, Deserialize)]
struct AssetMeta {
    path: String,
    content_type: Option<String>,
}

/// One versioned cache on disk: `<cache_dir>/<cache_name>/`.
/// Each entry is a `<key>.body` file plus a `<key>.json` file holding the
/// request path and content type. The json file is written last, so an
/// entry without one is incomplete and ignored.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub async fn open(cache_dir: &Path, cache_name: &str) -> anyhow::Result<Self> {
        let dir = cache_dir.join(cache_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create cache dir {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_paths(&self, path: &str) -> (PathBuf, PathBuf) {
        let key = hex::encode(Sha256::digest(path.as_bytes()));
        (self.dir.join(format!("{key}.body")), self.dir.join(format!("{key}.json")))
    }

    pub async fn put(&self, path: &str, asset: &CachedAsset) -> anyhow::Result<()> {
        let (body_path, meta_path) = self.entry_paths(path);
        let meta = serde_json::to_vec(&AssetMeta {
            path: path.to_string(),
            content_type: asset.content_type.clone(),
        })?;

        write_replacing(&body_path, &asset.body).await?;
        write_replacing(&meta_path, &meta).await?;
        Ok(())
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Option<CachedAsset>> {
        let (body_path, meta_path) = self.entry_paths(path);

        let meta = match tokio::fs::read(&meta_path).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let meta: AssetMeta = serde_json::from_slice(&meta)?;
        if meta.path != path {
            return Ok(None);
        }

        let body = match tokio::fs::read(&body_path).await {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(CachedAsset {
            content_type: meta.content_type,
            body: Bytes::from(body),
        }))
    }
}

/// Writes to a uniquely named file next to `target`, then renames it over the
/// target. Readers and overlapping writers only ever see whole files.
async fn write_replacing(target: &Path, contents: &[u8]) -> anyhow::Result<()> {
    static NEXT_TMP: AtomicU64 = AtomicU64::new(0);

    let tmp = target.with_extension(format!(
        "tmp.{}.{}",
        std::process::id(),
        NEXT_TMP.fetch_add(1, Ordering::Relaxed)
    ));

    if let Err(err) = tokio::fs::write(&tmp, contents).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    if let Err(err) = tokio::fs::rename(&tmp, target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    Network,
    Cache,
}

impl AssetSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetSource::Network => "network",
            AssetSource::Cache => "cache",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub source: AssetSource,
}

/// The network failed and nothing was cached for the path.
#[derive(Debug)]
pub struct Offline;

/// Network-first cache in front of an upstream origin.
#[derive(Clone)]
pub struct AssetCache {
    upstream: Arc<dyn Upstream>,
    disk: DiskCache,
}

impl AssetCache {
    pub fn new(upstream: Arc<dyn Upstream>, disk: DiskCache) -> Self {
        Self { upstream, disk }
    }

    /// Fetches every manifest path and stores them. Nothing is written unless
    /// all of them come back with 200.
    pub async fn install(&self, manifest: &[&str]) -> anyhow::Result<()> {
        let mut fetched = Vec::with_capacity(manifest.len());

        for path in manifest {
            let response = self
                .upstream
                .fetch(path)
                .await
                .with_context(|| format!("Failed to fetch {path} during install"))?;

            if response.status != StatusCode::OK {
                anyhow::bail!("Install fetch of {path} returned {}", response.status);
            }

            fetched.push((*path, response));
        }

        for (path, response) in fetched {
            self.disk
                .put(
                    path,
                    &CachedAsset {
                        content_type: response.content_type,
                        body: response.body,
                    },
                )
                .await
                .with_context(|| format!("Failed to store {path} during install"))?;
        }

        tracing::info!("Installed {} assets into {:?}", manifest.len(), self.disk.dir());
        Ok(())
    }

    /// Tries the network first. A 200 is stored and returned, any other
    /// status is returned untouched. Only when the network fails outright is
    /// the cache consulted.
    pub async fn fetch(&self, path: &str) -> Result<AssetResponse, Offline> {
        match self.upstream.fetch(path).await {
            Ok(UpstreamResponse {
                status,
                content_type,
                body,
            }) => {
                if status == StatusCode::OK {
                    let asset = CachedAsset {
                        content_type: content_type.clone(),
                        body: body.clone(),
                    };
                    if let Err(err) = self.disk.put(path, &asset).await {
                        tracing::warn!("Failed to cache {}: {:?}", path, err);
                    }
                }

                Ok(AssetResponse {
                    status,
                    content_type,
                    body,
                    source: AssetSource::Network,
                })
            }
            Err(network_err) => {
                tracing::debug!("Network fetch of {} failed: {:?}", path, network_err);

                match self.disk.get(path).await {
                    Ok(Some(asset)) => Ok(AssetResponse {
                        status: StatusCode::OK,
                        content_type: asset.content_type,
                        body: asset.body,
                        source: AssetSource::Cache,
                    }),
                    Ok(None) => Err(Offline),
                    Err(err) => {
                        tracing::warn!("Failed to read cached {}: {:?}", path, err);
                        Err(Offline)
                    }
                }
            }
        }
    }
}
