//! Shared counters for the /health endpoint.
//! Updated by the venue handlers, read by the health handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct HealthState {
    started_at: Instant,
    /// Venue requests answered, list and single-venue lookups alike.
    pub requests_served: AtomicU64,
    /// Individual exposure evaluations performed.
    pub venues_evaluated: AtomicU64,
    /// Forced refreshes requested through the API.
    pub refreshes: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_served: AtomicU64::new(0),
            venues_evaluated: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self, evaluated: usize) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        self.venues_evaluated.fetch_add(evaluated as u64, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn venues_evaluated(&self) -> u64 {
        self.venues_evaluated.load(Ordering::Relaxed)
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
