use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::health::HealthState;
use crate::clock::{instant_or_now, local_hour};
use crate::config::Config;
use crate::error::AppError;
use crate::state::VenueCache;
use crate::sun::{self, evaluate};
use crate::types::{LightSettings, SolarPosition, SunTimes, Venue, VenueSourceKind};

#[derive(Clone)]
pub struct ApiState {
    pub cfg: Arc<Config>,
    pub cache: Arc<VenueCache>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/barer", get(get_venues))
        .route("/api/barer/refresh", post(refresh_venues))
        .route("/api/bar/:id", get(get_venue))
        .route("/api/soltider/:id", get(get_sun_times))
        .route("/api/lys", get(get_light))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct VenuesQuery {
    /// Instant to evaluate at; defaults to now.
    pub tidspunkt: Option<String>,
    /// City filter.
    pub by: Option<String>,
    /// Only sunlit (true) or only shaded (false) venues.
    pub sol: Option<bool>,
    /// Free-text match on name or city.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtQuery {
    pub tidspunkt: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SunInfo {
    pub altitude: f64,
    pub azimuth: f64,
    /// Compass bearing of the sun, 0 = north.
    pub bearing: f64,
}

impl From<SolarPosition> for SunInfo {
    fn from(p: SolarPosition) -> Self {
        Self { altitude: p.altitude, azimuth: p.azimuth, bearing: p.bearing() }
    }
}

#[derive(Debug, Serialize)]
pub struct VenueResponse {
    #[serde(flatten)]
    pub venue: Venue,
    pub har_sol: bool,
    pub sol_info: SunInfo,
}

#[derive(Debug, Serialize)]
pub struct SunTimesResponse {
    pub bar: Venue,
    pub solopgang: Option<DateTime<Utc>>,
    pub solnedgang: Option<DateTime<Utc>>,
    pub solens_hoejdepunkt: DateTime<Utc>,
    pub times: SunTimes,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub source: VenueSourceKind,
}

#[derive(Debug, Serialize)]
pub struct LightResponse {
    pub tidspunkt: DateTime<Utc>,
    pub hour: u32,
    pub light: LightSettings,
    pub sol_info: SunInfo,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub venue_count: usize,
    pub source: Option<VenueSourceKind>,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub cache_age_secs: Option<u64>,
    pub uptime_secs: u64,
    pub requests_served: u64,
    pub venues_evaluated: u64,
    pub refreshes: u64,
}

// ---------------------------------------------------------------------------
// Venue evaluation
// ---------------------------------------------------------------------------

fn venue_response(venue: &Venue, at: DateTime<Utc>) -> VenueResponse {
    let exposure = evaluate(venue, at);
    VenueResponse {
        venue: venue.clone(),
        har_sol: exposure.sunlit,
        sol_info: exposure.position.into(),
    }
}

/// Evaluate every venue matching `by`/`q` at `at`, then apply the `sol` filter.
///
/// Also returns how many venues were evaluated, which counts those the
/// `sol` filter dropped.
pub fn venues_with_sunlight(
    venues: &[Venue],
    at: DateTime<Utc>,
    params: &VenuesQuery,
) -> (Vec<VenueResponse>, usize) {
    let city = params.by.as_deref().map(str::to_lowercase);
    let needle = params.q.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty());

    let evaluated: Vec<VenueResponse> = venues
        .iter()
        .filter(|v| city.as_ref().map_or(true, |c| v.city.to_lowercase() == *c))
        .filter(|v| {
            needle.as_ref().map_or(true, |q| {
                v.name.to_lowercase().contains(q.as_str()) || v.city.to_lowercase().contains(q.as_str())
            })
        })
        .map(|v| venue_response(v, at))
        .collect();

    let count = evaluated.len();
    let kept = evaluated
        .into_iter()
        .filter(|r| params.sol.map_or(true, |want| r.har_sol == want))
        .collect();
    (kept, count)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_venues(
    State(state): State<ApiState>,
    Query(params): Query<VenuesQuery>,
) -> Result<Json<Vec<VenueResponse>>, AppError> {
    let at = instant_or_now(params.tidspunkt.as_deref(), state.cfg.timezone)?;
    let snapshot = state.cache.get().await;

    let (venues, evaluated) = venues_with_sunlight(&snapshot.venues, at, &params);
    state.health.record_request(evaluated);
    Ok(Json(venues))
}

async fn get_venue(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Query(params): Query<AtQuery>,
) -> Result<Json<VenueResponse>, AppError> {
    let at = instant_or_now(params.tidspunkt.as_deref(), state.cfg.timezone)?;
    let snapshot = state.cache.get().await;
    let venue = snapshot
        .find(id)
        .ok_or_else(|| AppError::NotFound("Bar ikke fundet".to_string()))?;

    state.health.record_request(1);
    Ok(Json(venue_response(venue, at)))
}

async fn get_sun_times(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<Json<SunTimesResponse>, AppError> {
    let snapshot = state.cache.get().await;
    let venue = snapshot
        .find(id)
        .ok_or_else(|| AppError::NotFound("Bar ikke fundet".to_string()))?;

    let times = sun::sun_times(Utc::now(), venue.lat, venue.lng);
    Ok(Json(SunTimesResponse {
        bar: venue.clone(),
        solopgang: times.sunrise,
        solnedgang: times.sunset,
        solens_hoejdepunkt: times.solar_noon,
        times,
    }))
}

async fn refresh_venues(State(state): State<ApiState>) -> Json<RefreshResponse> {
    let snapshot = state.cache.refresh().await;
    state.health.record_refresh();

    let count = snapshot.venues.len();
    let message = match snapshot.source {
        VenueSourceKind::Osm => format!("Refreshed {count} bars from OpenStreetMap"),
        VenueSourceKind::Fallback => {
            format!("OpenStreetMap unavailable, serving {count} fallback bars")
        }
    };
    Json(RefreshResponse {
        success: snapshot.source == VenueSourceKind::Osm,
        message,
        count,
        source: snapshot.source,
    })
}

async fn get_light(
    State(state): State<ApiState>,
    Query(params): Query<AtQuery>,
) -> Result<Json<LightResponse>, AppError> {
    let at = instant_or_now(params.tidspunkt.as_deref(), state.cfg.timezone)?;
    let center = state.cfg.center;
    let position = sun::solar_position(at, center.lat, center.lng);
    let hour = local_hour(at, state.cfg.timezone);

    Ok(Json(LightResponse {
        tidspunkt: at,
        hour,
        light: sun::light_settings(hour, &position),
        sol_info: position.into(),
    }))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let snapshot = state.cache.peek().await;
    let health = &state.health;

    Json(HealthResponse {
        status: "ok",
        venue_count: snapshot.as_ref().map_or(0, |s| s.venues.len()),
        source: snapshot.as_ref().map(|s| s.source),
        last_fetch_at: snapshot.as_ref().map(|s| s.fetched_at),
        cache_age_secs: snapshot.as_ref().map(|s| s.age().as_secs()),
        uptime_secs: health.uptime_secs(),
        requests_served: health.requests_served(),
        venues_evaluated: health.venues_evaluated(),
        refreshes: health.refreshes(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::error::Result;
    use crate::state::venue_cache::tests::ScriptedSource;
    use crate::types::Orientation;

    const MIDSUMMER_AFTERNOON: &str = "2025-06-21T16:00:00Z";

    fn aarhus_venues() -> Vec<Venue> {
        vec![
            Venue::new(1, "Gyngen", "Aarhus", 56.1566, 10.2073, Orientation::West),
            Venue::new(2, "Løve's Kaffebar", "Aarhus", 56.1583, 10.2087, Orientation::East),
            Venue::new(3, "Mikkeller", "København", 55.6761, 12.5683, Orientation::West),
        ]
    }

    fn app(script: Vec<Result<Vec<Venue>>>) -> Router {
        let source = ScriptedSource::new(script);
        router(ApiState {
            cfg: Arc::new(Config::default()),
            cache: VenueCache::new(source, Duration::from_secs(3600)),
            health: Arc::new(HealthState::new()),
        })
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[test]
    fn filters_combine() {
        let at: DateTime<Utc> = MIDSUMMER_AFTERNOON.parse().unwrap();
        let venues = aarhus_venues();

        let (all, evaluated) = venues_with_sunlight(&venues, at, &VenuesQuery::default());
        assert_eq!(all.len(), 3);
        assert_eq!(evaluated, 3);

        let aarhus = VenuesQuery { by: Some("aarhus".into()), ..Default::default() };
        assert_eq!(venues_with_sunlight(&venues, at, &aarhus).0.len(), 2);

        let lit = VenuesQuery { sol: Some(true), ..Default::default() };
        let (lit, evaluated) = venues_with_sunlight(&venues, at, &lit);
        let names: Vec<_> = lit.into_iter().map(|r| r.venue.name).collect();
        assert_eq!(names, vec!["Gyngen", "Mikkeller"]);
        assert_eq!(evaluated, 3);

        let search = VenuesQuery { q: Some("KØBEN".into()), ..Default::default() };
        assert_eq!(venues_with_sunlight(&venues, at, &search).0.len(), 1);
    }

    #[tokio::test]
    async fn venues_carry_exposure() {
        let app = app(vec![Ok(aarhus_venues())]);
        let (status, body) =
            send(app, "GET", &format!("/api/barer?tidspunkt={MIDSUMMER_AFTERNOON}")).await;

        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0]["name"], "Gyngen");
        assert_eq!(list[0]["orientation"], "west");
        assert_eq!(list[0]["har_sol"], true);
        assert_eq!(list[1]["har_sol"], false);
        let altitude = list[0]["sol_info"]["altitude"].as_f64().unwrap();
        assert!(altitude > 25.0 && altitude < 35.0, "altitude={altitude}");
    }

    #[tokio::test]
    async fn bad_timestamp_is_400() {
        let app = app(vec![Ok(aarhus_venues())]);
        let (status, body) = send(app, "GET", "/api/barer?tidspunkt=soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("soon"));
    }

    #[tokio::test]
    async fn single_venue_and_missing_venue() {
        let (status, body) = send(app(vec![Ok(aarhus_venues())]), "GET", "/api/bar/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 2);

        let (status, body) = send(app(vec![Ok(aarhus_venues())]), "GET", "/api/bar/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Bar ikke fundet");
    }

    #[tokio::test]
    async fn sun_times_for_venue() {
        let (status, body) = send(app(vec![Ok(aarhus_venues())]), "GET", "/api/soltider/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bar"]["name"], "Gyngen");
        assert!(body["solens_hoejdepunkt"].is_string());
        assert!(body["times"]["nadir"].is_string());

        let (status, _) = send(app(vec![Ok(aarhus_venues())]), "GET", "/api/soltider/9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refresh_reports_source() {
        let app = app(vec![Ok(aarhus_venues()), Ok(aarhus_venues()[..1].to_vec())]);
        let (_, _) = send(app.clone(), "GET", "/api/barer").await;

        let (status, body) = send(app.clone(), "POST", "/api/barer/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        assert_eq!(body["source"], "osm");

        // script exhausted: upstream is now down
        let (_, body) = send(app, "POST", "/api/barer/refresh").await;
        assert_eq!(body["success"], false);
        assert_eq!(body["source"], "fallback");
        assert_eq!(body["count"], 10);
    }

    #[tokio::test]
    async fn light_follows_local_hour() {
        let (status, body) =
            send(app(vec![]), "GET", "/api/lys?tidspunkt=2025-06-21T12:00:00Z").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hour"], 14);
        assert_eq!(body["light"]["color"], sun::lighting::DAY_COLOR);
        assert_eq!(body["light"]["anchor"], "viewport");

        let (_, body) = send(app(vec![]), "GET", "/api/lys?tidspunkt=2025-12-21T22:00:00Z").await;
        assert_eq!(body["light"]["color"], sun::lighting::NIGHT_LIGHT_COLOR);
        assert_eq!(body["light"]["intensity"], 0.15);
    }

    #[tokio::test]
    async fn health_reflects_cache() {
        let app = app(vec![Ok(aarhus_venues())]);
        let (_, body) = send(app.clone(), "GET", "/health").await;
        assert_eq!(body["venue_count"], 0);
        assert!(body["source"].is_null());

        send(app.clone(), "GET", "/api/barer").await;
        let (status, body) = send(app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["venue_count"], 3);
        assert_eq!(body["source"], "osm");
        assert_eq!(body["requests_served"], 1);
        assert_eq!(body["venues_evaluated"], 3);
    }

    #[tokio::test]
    async fn shaded_venues_still_count_as_evaluated() {
        let app = app(vec![Ok(aarhus_venues())]);
        let (_, list) = send(
            app.clone(),
            "GET",
            &format!("/api/barer?sol=true&tidspunkt={MIDSUMMER_AFTERNOON}"),
        )
        .await;
        assert_eq!(list.as_array().unwrap().len(), 2);

        send(app.clone(), "GET", "/api/bar/1").await;
        let (_, body) = send(app, "GET", "/health").await;
        assert_eq!(body["requests_served"], 2);
        assert_eq!(body["venues_evaluated"], 4);
    }
}
