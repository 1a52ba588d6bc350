//! Geometry, projection, configuration and the rendering-engine boundary

pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod projection;
