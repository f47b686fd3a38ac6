use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use local_ip_address::local_ip;
use server::{
    asset_cache::{AssetCache, DiskCache},
    asset_endpoint,
    configuration::{Configuration, ASSET_MANIFEST},
    server_state::ServerState,
    upstream::HttpUpstream,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about = "Offline asset cache for the distance tracker web app")]
struct Args {
    /// key = value config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Configuration::load(path).await?,
        None => Configuration::default(),
    };

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log dir {:?}", config.log_dir))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_dir.join("server.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,tower_http=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let upstream = Arc::new(HttpUpstream::new(config.upstream.clone())?);
    let disk = DiskCache::open(&config.cache_dir, &config.cache_name).await?;
    let cache = AssetCache::new(upstream, disk);

    // A failed install leaves the cache as it was; requests still go network first.
    if let Err(err) = cache.install(ASSET_MANIFEST).await {
        tracing::warn!("Cache install failed: {:?}", err);
    }

    let server_state = Arc::new(ServerState {
        cache,
        ip_address: local_ip().ok(),
    });

    let app = asset_endpoint::router(server_state.clone()).layer(TraceLayer::new_for_http());

    if let Some(ip) = server_state.ip_address {
        tracing::debug!("Reachable on the local network at {}:{}", ip, config.listen.port());
    }

    match (&config.tls_cert, &config.tls_key) {
        (Some(cert), Some(key)) => {
            // Browsers only expose geolocation to secure origins.
            let tls = RustlsConfig::from_pem_file(cert, key)
                .await
                .context("Failed to load TLS certificate")?;

            tracing::info!("Listening on https://{}", config.listen);
            axum_server::bind_rustls(config.listen, tls)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await?;
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(config.listen).await?;
            tracing::info!("Listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
