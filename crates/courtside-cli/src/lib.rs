// Courtside command-line driver: configuration and slate loading around the
// lineup engine.

pub mod config;
pub mod pool;
