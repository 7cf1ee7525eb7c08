//! Core library for the BOM weather entities.
//!
//! This crate defines:
//! - Typed collector records and the snapshot they form
//! - BOM icon descriptor to host condition mapping
//! - The coordinator that refreshes a collector and notifies listeners
//! - Daily and hourly weather entities projecting the snapshot
//! - Configuration of the location entry
//!
//! It is used by `bom-weather-cli`, but can also be embedded by other hosts.

pub mod collector;
pub mod condition;
pub mod config;
pub mod consts;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod model;
pub mod setup;

pub use collector::{Collector, JsonFileCollector, MemoryCollector, SnapshotCell};
pub use condition::{Condition, map_condition};
pub use config::{Config, EntrySettings};
pub use coordinator::{Coordinator, ListenerHandle};
pub use entity::{
    Forecast, Granularity, Published, StateLog, StateWriter, WeatherEntity, WeatherState,
};
pub use error::EntityError;
pub use model::{
    DailyForecastEntry, HourlyForecastEntry, LocationMetadata, ObservationRecord,
    WeatherSnapshot, WindBearing,
};
pub use setup::setup_entry;
