//! Lane-based rhythm judgment engine: converts a timestamped chart into
//! schedulable tiles, keeps the playback clock, chart time and screen
//! position in sync, and resolves key presses against the active tile set
//! with deterministic timing windows.

pub mod config;
pub mod core;
pub mod game;
pub mod settings;
