#![deny(warnings)]

//! Runtime for the city simulation: the `City` aggregate, its observers, the
//! controller that owns the tick source, and the rolling statistics history.
//!
//! Everything here is single-threaded. Mutations run synchronously and
//! notify observers before returning.

pub mod city;
pub mod config;
pub mod controller;
pub mod events;
pub mod history;

pub use city::{City, CitySnapshot, PlacementError};
pub use config::{ConfigError, SimulationConfig, MAX_GRID_SIDE};
pub use controller::{SimulationController, SpeedPreset, DEFAULT_TICK_INTERVAL, MIN_TICK_INTERVAL};
pub use events::{CityEvent, ControlEvent, EventBus, ListenerId};
pub use history::{StatsHistory, DEFAULT_HISTORY_LEN};
