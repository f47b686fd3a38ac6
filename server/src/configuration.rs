use std::{net::SocketAddr, path::PathBuf};

use anyhow::{anyhow, Context};

pub const DEFAULT_CACHE_NAME: &str = "gps-tracker-cache-v1";

/// Assets stored when the cache is installed, before any request comes in.
pub const ASSET_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/style.css",
    "/app.js",
    "/manifest.json",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub listen: SocketAddr,
    /// Origin the app is served from, e.g. `https://tracker.example.com`.
    pub upstream: String,
    pub cache_dir: PathBuf,
    /// Versioned cache name. Changing it starts a fresh cache next to the old one.
    pub cache_name: String,
    pub log_dir: PathBuf,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            upstream: "http://127.0.0.1:8000".into(),
            cache_dir: PathBuf::from("server/cache"),
            cache_name: DEFAULT_CACHE_NAME.into(),
            log_dir: PathBuf::from("server/log"),
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl Configuration {
    /// Reads `key = value` lines. Blank lines and `#` comments are skipped,
    /// unknown keys are warned about, missing keys keep their defaults.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut config = Self::default();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(anyhow!("Line {}: expected `key = value`, got {:?}", number + 1, line));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "listen" => {
                    config.listen = value
                        .parse()
                        .with_context(|| format!("Line {}: invalid listen address {:?}", number + 1, value))?
                }
                "upstream" => config.upstream = value.trim_end_matches('/').to_string(),
                "cache_dir" => config.cache_dir = PathBuf::from(value),
                "cache_name" => config.cache_name = value.to_string(),
                "log_dir" => config.log_dir = PathBuf::from(value),
                "tls_cert" => config.tls_cert = Some(PathBuf::from(value)),
                "tls_key" => config.tls_key = Some(PathBuf::from(value)),
                _ => tracing::warn!("Unknown config key: {}", key),
            }
        }

        if config.cache_name.is_empty() || config.cache_name.contains(['/', '\\']) {
            return Err(anyhow!("cache_name must be a plain directory name, got {:?}", config.cache_name));
        }

        if config.tls_cert.is_some() != config.tls_key.is_some() {
            return Err(anyhow!("tls_cert and tls_key must be set together"));
        }

        Ok(config)
    }

    pub async fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::parse(&text)
    }
}
