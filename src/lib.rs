//! Sunlit-bar finder: OpenStreetMap bars and pubs, classified by whether
//! direct sunlight reaches their façade at a given instant.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod overpass;
pub mod state;
pub mod sun;
pub mod types;
