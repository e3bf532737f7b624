use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::Result;
use crate::state::fallback::fallback_venues;
use crate::types::{Venue, VenueSourceKind};

/// Upstream provider of venues. The cache calls it on a miss.
#[async_trait]
pub trait VenueSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Venue>>;
}

/// Immutable view of the venue list at one point in time. Cheap to clone.
#[derive(Debug, Clone)]
pub struct VenueSnapshot {
    pub venues: Arc<Vec<Venue>>,
    pub source: VenueSourceKind,
    pub fetched_at: DateTime<Utc>,
    loaded_at: Instant,
}

impl VenueSnapshot {
    fn new(venues: Vec<Venue>, source: VenueSourceKind) -> Self {
        Self {
            venues: Arc::new(venues),
            source,
            fetched_at: Utc::now(),
            loaded_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    pub fn find(&self, id: u64) -> Option<&Venue> {
        self.venues.iter().find(|v| v.id == id)
    }
}

/// Venue list cache with a single time-to-live.
///
/// Only live upstream data is considered fresh: a fallback list is served but
/// the next `get()` retries the source. When a refetch fails, whatever was
/// loaded last keeps being served; the built-in fallback is used only when
/// nothing was ever loaded (or after `invalidate()`).
///
/// Callers that queue behind an in-flight load take its outcome, success or
/// failure, instead of starting another fetch.
pub struct VenueCache {
    source: Arc<dyn VenueSource>,
    ttl: Duration,
    entry: RwLock<Option<VenueSnapshot>>,
    /// Serializes upstream fetches so concurrent misses trigger one request.
    loading: Mutex<()>,
    /// Completed loads. Bumped under `loading`.
    generation: AtomicU64,
}

impl VenueCache {
    pub fn new(source: Arc<dyn VenueSource>, ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            ttl,
            entry: RwLock::new(None),
            loading: Mutex::new(()),
            generation: AtomicU64::new(0),
        })
    }

    fn is_fresh(&self, snapshot: &VenueSnapshot) -> bool {
        snapshot.source == VenueSourceKind::Osm && snapshot.age() < self.ttl
    }

    /// Current venues, fetching from the source when the cached list has expired.
    pub async fn get(&self) -> VenueSnapshot {
        let seen = self.generation.load(Ordering::Acquire);
        if let Some(snapshot) = self.entry.read().await.as_ref() {
            if self.is_fresh(snapshot) {
                return snapshot.clone();
            }
        }

        let _guard = self.loading.lock().await;
        // Another task loaded while we waited for the lock.
        if let Some(snapshot) = self.entry.read().await.as_ref() {
            if self.is_fresh(snapshot) || self.generation.load(Ordering::Acquire) != seen {
                return snapshot.clone();
            }
        }
        self.load().await
    }

    /// Cached venues without touching the source, if anything is loaded.
    pub async fn peek(&self) -> Option<VenueSnapshot> {
        self.entry.read().await.clone()
    }

    /// Drop the cached list; the next `get()` goes to the source.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
        info!("[CACHE] invalidated");
    }

    /// Invalidate and reload immediately.
    pub async fn refresh(&self) -> VenueSnapshot {
        let _guard = self.loading.lock().await;
        self.invalidate().await;
        self.load().await
    }

    /// Caller must hold `loading`.
    async fn load(&self) -> VenueSnapshot {
        let snapshot = self.fetch_or_fallback().await;
        self.generation.fetch_add(1, Ordering::Release);
        snapshot
    }

    async fn fetch_or_fallback(&self) -> VenueSnapshot {
        match self.source.fetch().await {
            Ok(venues) => {
                let snapshot = VenueSnapshot::new(venues, VenueSourceKind::Osm);
                info!(
                    "[CACHE] loaded {} venues (ttl {}s)",
                    snapshot.venues.len(),
                    self.ttl.as_secs()
                );
                *self.entry.write().await = Some(snapshot.clone());
                snapshot
            }
            Err(e) => {
                let mut entry = self.entry.write().await;
                if let Some(stale) = entry.as_ref() {
                    warn!(
                        "[CACHE] fetch failed, serving {} {} venues loaded {}s ago: {e}",
                        stale.venues.len(),
                        stale.source,
                        stale.age().as_secs()
                    );
                    return stale.clone();
                }
                let snapshot = VenueSnapshot::new(fallback_venues(), VenueSourceKind::Fallback);
                warn!(
                    "[CACHE] fetch failed, serving {} fallback venues: {e}",
                    snapshot.venues.len()
                );
                *entry = Some(snapshot.clone());
                snapshot
            }
        }
    }
}
