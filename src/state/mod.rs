pub mod fallback;
pub mod venue_cache;

pub use venue_cache::{VenueCache, VenueSnapshot, VenueSource};
