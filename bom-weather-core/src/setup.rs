use std::sync::Arc;

use crate::{
    config::Config,
    coordinator::Coordinator,
    entity::{Granularity, StateWriter, WeatherEntity},
};

/// Create the daily and hourly entities for a configured location.
///
/// Entities are returned detached; the host calls [`WeatherEntity::attach`]
/// once it has registered them.
pub fn setup_entry(
    config: &Config,
    coordinator: &Arc<Coordinator>,
    writer: &Arc<dyn StateWriter>,
) -> Vec<Arc<WeatherEntity>> {
    let location_name = config.location_name();

    tracing::info!(location = %location_name, "setting up BOM weather entities");

    Granularity::all()
        .iter()
        .map(|granularity| {
            Arc::new(WeatherEntity::new(
                *granularity,
                location_name,
                Arc::clone(coordinator),
                Arc::clone(writer),
            ))
        })
        .collect()
}
