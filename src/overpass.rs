use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{Config, OVERPASS_QUERY_TIMEOUT_SECS, UNKNOWN_CITY, UNNAMED_VENUE};
use crate::error::{AppError, Result};
use crate::state::venue_cache::VenueSource;
use crate::types::{BoundingBox, Coordinate, Orientation, Venue};

/// Known city boxes, checked in order.
const CITY_BOXES: &[(&str, BoundingBox)] = &[
    ("Aarhus", BoundingBox { min_lat: 56.13, min_lng: 10.15, max_lat: 56.20, max_lng: 10.26 }),
    ("København", BoundingBox { min_lat: 55.6, min_lng: 12.5, max_lat: 55.75, max_lng: 12.65 }),
    ("Odense", BoundingBox { min_lat: 55.35, min_lng: 10.35, max_lat: 55.45, max_lng: 10.45 }),
    ("Aalborg", BoundingBox { min_lat: 57.0, min_lng: 9.85, max_lat: 57.1, max_lng: 10.0 }),
];

#[derive(Debug, Default)]
pub struct FetchStats {
    pub api_total: usize,
    pub rejected_not_poi: usize,
    pub rejected_no_coordinates: usize,
    pub unnamed: usize,
    pub qualified: usize,
}

enum Rejection {
    /// Not a node/way, or carries no tags.
    NotPoi,
    NoCoordinates,
}

/// Overpass QL for every bar and pub node/way inside `bbox`, with way centres.
pub fn build_query(bbox: &BoundingBox) -> String {
    let b = format!("{},{},{},{}", bbox.min_lat, bbox.min_lng, bbox.max_lat, bbox.max_lng);
    format!(
        "[out:json][timeout:{OVERPASS_QUERY_TIMEOUT_SECS}];\n\
         (\n\
         \x20 node[\"amenity\"=\"bar\"]({b});\n\
         \x20 node[\"amenity\"=\"pub\"]({b});\n\
         \x20 way[\"amenity\"=\"bar\"]({b});\n\
         \x20 way[\"amenity\"=\"pub\"]({b});\n\
         );\n\
         out body center;\n"
    )
}

/// Venue source backed by the public Overpass API.
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
    bbox: BoundingBox,
    center: Coordinate,
}

impl OverpassClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.overpass_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: cfg.overpass_url.clone(),
            bbox: cfg.bbox,
            center: cfg.center,
        })
    }

    /// POST the query and map the response into venues.
    pub async fn fetch_venues(&self) -> Result<(Vec<Venue>, FetchStats)> {
        let query = build_query(&self.bbox);
        debug!("[OVERPASS] POST {} bbox={:?}", self.url, self.bbox);

        let resp = self.client.post(&self.url).body(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("Overpass API error: {status}")));
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body, self.center)
    }
}

#[async_trait]
impl VenueSource for OverpassClient {
    async fn fetch(&self) -> Result<Vec<Venue>> {
        let (venues, stats) = self.fetch_venues().await?;
        info!(
            "[OVERPASS] {} venues from {} elements (not_poi={} no_coords={} unnamed={})",
            stats.qualified,
            stats.api_total,
            stats.rejected_not_poi,
            stats.rejected_no_coordinates,
            stats.unnamed,
        );
        Ok(venues)
    }
}

/// Map an Overpass JSON response into venues with sequential ids starting at 1.
pub fn parse_response(
    body: &serde_json::Value,
    center: Coordinate,
) -> Result<(Vec<Venue>, FetchStats)> {
    let elements = body
        .get("elements")
        .and_then(|e| e.as_array())
        .ok_or_else(|| AppError::Upstream("Overpass response has no elements array".to_string()))?;

    let mut stats = FetchStats { api_total: elements.len(), ..Default::default() };
    let mut venues = Vec::with_capacity(elements.len());

    for element in elements {
        let next_id = venues.len() as u64 + 1;
        match parse_element(element, next_id, center) {
            Ok(venue) => {
                if venue.name == UNNAMED_VENUE {
                    stats.unnamed += 1;
                }
                venues.push(venue);
            }
            Err(Rejection::NotPoi) => stats.rejected_not_poi += 1,
            Err(Rejection::NoCoordinates) => {
                stats.rejected_no_coordinates += 1;
                let osm_id = element.get("id").and_then(|i| i.as_i64()).unwrap_or_default();
                warn!("[OVERPASS] skipping element {osm_id}: no coordinates");
            }
        }
    }

    stats.qualified = venues.len();
    Ok((venues, stats))
}

fn parse_element(
    v: &serde_json::Value,
    id: u64,
    center: Coordinate,
) -> std::result::Result<Venue, Rejection> {
    let osm_type = v.get("type").and_then(|t| t.as_str()).unwrap_or("");
    if osm_type != "node" && osm_type != "way" {
        return Err(Rejection::NotPoi);
    }
    let tags = v
        .get("tags")
        .and_then(|t| t.as_object())
        .ok_or(Rejection::NotPoi)?;
    let tag = |key: &str| tag_value(tags, key).map(str::to_string);

    // Nodes carry lat/lon directly; ways carry a computed centre.
    let lat = v
        .get("lat")
        .and_then(|x| x.as_f64())
        .or_else(|| v.get("center").and_then(|c| c.get("lat")).and_then(|x| x.as_f64()));
    let lng = v
        .get("lon")
        .and_then(|x| x.as_f64())
        .or_else(|| v.get("center").and_then(|c| c.get("lon")).and_then(|x| x.as_f64()));
    let (Some(lat), Some(lng)) = (lat, lng) else {
        return Err(Rejection::NoCoordinates);
    };

    let name = tag("name")
        .or_else(|| tag("name:da"))
        .unwrap_or_else(|| UNNAMED_VENUE.to_string());

    Ok(Venue {
        id,
        name,
        city: city_for(lat, lng).to_string(),
        lat,
        lng,
        orientation: orientation_for(lat, lng, center),
        amenity: tag("amenity"),
        address: build_address(tags),
        opening_hours: tag("opening_hours"),
        phone: tag("phone").or_else(|| tag("contact:phone")),
        website: tag("website").or_else(|| tag("contact:website")),
        email: tag("email").or_else(|| tag("contact:email")),
        description: tag("description"),
        cuisine: tag("cuisine"),
        outdoor_seating: tag("outdoor_seating"),
        osm_id: v.get("id").and_then(|i| i.as_i64()),
        osm_type: Some(osm_type.to_string()),
    })
}

/// Empty tag values count as absent.
fn tag_value<'a>(
    tags: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<&'a str> {
    tags.get(key).and_then(|t| t.as_str()).filter(|s| !s.is_empty())
}

/// "Street 12, 8000 Aarhus C" from the `addr:*` tags, or None when no part is present.
pub fn build_address(tags: &serde_json::Map<String, serde_json::Value>) -> Option<String> {
    let tag = |key: &str| tag_value(tags, key);
    let mut parts = Vec::new();

    if let Some(street) = tag("addr:street") {
        match tag("addr:housenumber") {
            Some(number) => parts.push(format!("{street} {number}")),
            None => parts.push(street.to_string()),
        }
    }

    match (tag("addr:postcode"), tag("addr:city")) {
        (Some(postcode), Some(city)) => parts.push(format!("{postcode} {city}")),
        (None, Some(city)) => parts.push(city.to_string()),
        _ => {}
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

pub fn city_for(lat: f64, lng: f64) -> &'static str {
    CITY_BOXES
        .iter()
        .find(|(_, bbox)| bbox.contains(lat, lng))
        .map(|(name, _)| *name)
        .unwrap_or(UNKNOWN_CITY)
}

/// Quadrant heuristic: the dominant offset from `center` decides the façade direction.
pub fn orientation_for(lat: f64, lng: f64, center: Coordinate) -> Orientation {
    let lat_diff = lat - center.lat;
    let lng_diff = lng - center.lng;

    if lat_diff.abs() > lng_diff.abs() {
        if lat_diff > 0.0 {
            Orientation::North
        } else {
            Orientation::South
        }
    } else if lng_diff > 0.0 {
        Orientation::East
    } else {
        Orientation::West
    }
}
