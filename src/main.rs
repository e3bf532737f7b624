use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use solskin::api::health::HealthState;
use solskin::api::routes::{router, ApiState};
use solskin::config::Config;
use solskin::error::Result;
use solskin::overpass::OverpassClient;
use solskin::state::VenueCache;
use solskin::types::VenueSourceKind;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!(
        "Config: city={} center={:.4},{:.4} bbox={:?} ttl={}s tz={}",
        cfg.city, cfg.center.lat, cfg.center.lng, cfg.bbox, cfg.cache_ttl_secs, cfg.timezone,
    );

    // --- Venue cache backed by Overpass ---
    let source = Arc::new(OverpassClient::new(&cfg)?);
    let cache = VenueCache::new(source, Duration::from_secs(cfg.cache_ttl_secs));

    if cfg.prefetch {
        let snapshot = cache.get().await;
        match snapshot.source {
            VenueSourceKind::Osm => {
                info!("Bootstrap complete: {} venues from OpenStreetMap", snapshot.venues.len())
            }
            VenueSourceKind::Fallback => warn!(
                "Bootstrap fell back to {} built-in venues; will retry Overpass on next request",
                snapshot.venues.len()
            ),
        }
    }

    // --- HTTP API server ---
    let state = ApiState {
        cfg: Arc::new(cfg.clone()),
        cache,
        health: Arc::new(HealthState::new()),
    };
    let app = router(state);
    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Solskin listening on http://{bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
