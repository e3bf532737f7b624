//! Solar geometry: where the sun is, which façades it reaches, and how the map is lit.

pub mod exposure;
pub mod lighting;
pub mod position;

pub use exposure::{evaluate, is_sunlit, is_sunlit_named};
pub use lighting::{light_color, light_settings};
pub use position::{solar_position, sun_times};
