// Warp and map-transition orchestration for tile-based overworlds

pub mod config;
pub mod core;
pub mod logging;
