//! Host-facing weather entities.
//!
//! One [`WeatherEntity`] type serves both the daily and the hourly view; the
//! [`Granularity`] only decides naming and which forecast series is
//! projected. Entities cache nothing: every read goes back to the
//! collector's current snapshot.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    collector::Collector,
    condition::{Condition, condition_from_hourly, map_condition},
    consts::{
        ATTRIBUTION, DOMAIN, MODEL_NAME, SHORT_ATTRIBUTION, SPEED_KILOMETERS_PER_HOUR,
        TEMP_CELSIUS,
    },
    coordinator::{Coordinator, ListenerHandle},
    error::{EntityError, Result},
    model::{DailyForecastEntry, HourlyForecastEntry, WeatherSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Hourly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
        }
    }

    pub const fn all() -> &'static [Granularity] {
        &[Granularity::Daily, Granularity::Hourly]
    }

    /// Project this granularity's forecast series out of a snapshot.
    pub fn forecast(&self, snapshot: &WeatherSnapshot) -> Result<Vec<Forecast>> {
        let tz = snapshot.location()?.tz()?;

        match self {
            Granularity::Daily => {
                snapshot.daily()?.iter().map(|day| project_daily(day, tz)).collect()
            }
            Granularity::Hourly => {
                snapshot.hourly()?.iter().map(|hour| project_hourly(hour, tz)).collect()
            }
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceEntryType {
    Service,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub entry_type: DeviceEntryType,
    pub identifiers: Vec<(String, String)>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
}

/// One forecast period in the host's schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// RFC 3339 timestamp in the location's timezone.
    pub datetime: String,
    pub native_temperature: f64,
    pub condition: Condition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_precipitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_bearing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gust_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv: Option<f64>,
}

/// ISO-8601 layouts accepted besides RFC 3339, with an explicit offset.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];

/// Layouts without an offset; these are read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    if let Some(parsed) =
        OFFSET_FORMATS.iter().find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Re-serialize an ISO-8601 timestamp in the given timezone.
///
/// Timestamps without an offset, including bare dates, are taken as UTC.
pub fn localize_timestamp(value: &str, tz: Tz) -> Result<String> {
    let instant = match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(source) => parse_iso8601(value)
            .ok_or_else(|| EntityError::InvalidTimestamp { value: value.to_string(), source })?,
    };

    Ok(instant.with_timezone(&tz).to_rfc3339())
}

/// Daily entries carry no night flag, so the day table always applies.
pub fn project_daily(day: &DailyForecastEntry, tz: Tz) -> Result<Forecast> {
    Ok(Forecast {
        datetime: localize_timestamp(&day.date, tz)?,
        native_temperature: day.temp_max,
        condition: map_condition(&day.icon_descriptor, false)?,
        templow: day.temp_min,
        native_precipitation: day.rain_amount_max,
        precipitation_probability: day.rain_chance,
        wind_bearing: None,
        native_wind_speed: None,
        wind_gust_speed: None,
        humidity: None,
        uv: None,
    })
}

pub fn project_hourly(hour: &HourlyForecastEntry, tz: Tz) -> Result<Forecast> {
    Ok(Forecast {
        datetime: localize_timestamp(&hour.time, tz)?,
        native_temperature: hour.temp,
        condition: condition_from_hourly(hour)?,
        templow: None,
        native_precipitation: hour.rain_amount_max,
        precipitation_probability: hour.rain_chance,
        wind_bearing: Some(hour.wind_direction.degrees()),
        native_wind_speed: Some(hour.wind_speed_kilometre),
        wind_gust_speed: hour.wind_gust_speed_kilometre,
        humidity: Some(hour.relative_humidity),
        uv: hour.uv,
    })
}

/// Everything an entity publishes to the host in one write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherState {
    pub name: String,
    pub unique_id: String,
    pub attribution: String,
    pub condition: Condition,
    pub icon: String,
    pub native_temperature: f64,
    pub native_temperature_unit: String,
    pub humidity: f64,
    pub native_wind_speed: f64,
    pub native_wind_speed_unit: String,
    pub wind_bearing: f64,
    pub forecast: Vec<Forecast>,
}

/// The host platform's state layer.
pub trait StateWriter: Send + Sync {
    fn write_state(&self, unique_id: &str, state: &WeatherState);

    /// Called instead of `write_state` when the state could not be built.
    fn write_unavailable(&self, unique_id: &str, error: &EntityError);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Published {
    Available { unique_id: String, state: WeatherState },
    Unavailable { unique_id: String, reason: String },
}

impl Published {
    pub fn unique_id(&self) -> &str {
        match self {
            Published::Available { unique_id, .. } | Published::Unavailable { unique_id, .. } => {
                unique_id
            }
        }
    }
}

/// [`StateWriter`] that records every write in memory.
#[derive(Debug, Default)]
pub struct StateLog {
    entries: Mutex<Vec<Published>>,
}

impl StateLog {
    pub fn entries(&self) -> Vec<Published> {
        self.entries.lock().clone()
    }

    pub fn writes_for(&self, unique_id: &str) -> usize {
        self.entries.lock().iter().filter(|p| p.unique_id() == unique_id).count()
    }

    pub fn latest(&self, unique_id: &str) -> Option<Published> {
        self.entries.lock().iter().rev().find(|p| p.unique_id() == unique_id).cloned()
    }
}

impl StateWriter for StateLog {
    fn write_state(&self, unique_id: &str, state: &WeatherState) {
        self.entries.lock().push(Published::Available {
            unique_id: unique_id.to_string(),
            state: state.clone(),
        });
    }

    fn write_unavailable(&self, unique_id: &str, error: &EntityError) {
        self.entries.lock().push(Published::Unavailable {
            unique_id: unique_id.to_string(),
            reason: error.to_string(),
        });
    }
}

/// A BOM weather entity for one configured location.
pub struct WeatherEntity {
    granularity: Granularity,
    location_name: String,
    collector: Arc<dyn Collector>,
    coordinator: Arc<Coordinator>,
    writer: Arc<dyn StateWriter>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl std::fmt::Debug for WeatherEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherEntity")
            .field("granularity", &self.granularity)
            .field("location_name", &self.location_name)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl WeatherEntity {
    pub fn new(
        granularity: Granularity,
        location_name: impl Into<String>,
        coordinator: Arc<Coordinator>,
        writer: Arc<dyn StateWriter>,
    ) -> Self {
        Self {
            granularity,
            location_name: location_name.into(),
            collector: Arc::clone(coordinator.collector()),
            coordinator,
            writer,
            listener: Mutex::new(None),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn name(&self) -> String {
        match self.granularity {
            Granularity::Daily => self.location_name.clone(),
            Granularity::Hourly => format!("{} Hourly", self.location_name),
        }
    }

    pub fn unique_id(&self) -> String {
        match self.granularity {
            Granularity::Daily => self.location_name.clone(),
            Granularity::Hourly => format!("{}_hourly", self.location_name),
        }
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            entry_type: DeviceEntryType::Service,
            identifiers: vec![(DOMAIN.to_string(), self.location_name.clone())],
            manufacturer: SHORT_ATTRIBUTION.to_string(),
            model: MODEL_NAME.to_string(),
            name: self.location_name.clone(),
        }
    }

    pub fn attribution(&self) -> &'static str {
        ATTRIBUTION
    }

    /// Entities only change state when the coordinator notifies them.
    pub fn should_poll(&self) -> bool {
        false
    }

    pub fn native_temperature_unit(&self) -> &'static str {
        TEMP_CELSIUS
    }

    pub fn native_wind_speed_unit(&self) -> &'static str {
        SPEED_KILOMETERS_PER_HOUR
    }

    pub fn native_temperature(&self) -> Result<f64> {
        Ok(self.collector.snapshot().observation()?.temp)
    }

    pub fn humidity(&self) -> Result<f64> {
        Ok(self.collector.snapshot().observation()?.humidity)
    }

    pub fn native_wind_speed(&self) -> Result<f64> {
        Ok(self.collector.snapshot().observation()?.wind_speed_kilometre)
    }

    pub fn wind_bearing(&self) -> Result<f64> {
        Ok(self.collector.snapshot().observation()?.wind_direction.degrees())
    }

    /// Icon of the soonest forecast day, as supplied by the collector.
    pub fn icon(&self) -> Result<String> {
        Ok(self.collector.snapshot().first_daily()?.mdi_icon.clone())
    }

    /// Current condition, always taken from the soonest hourly entry.
    pub fn condition(&self) -> Result<Condition> {
        condition_from_hourly(self.collector.snapshot().first_hourly()?)
    }

    pub fn forecast(&self) -> Result<Vec<Forecast>> {
        self.granularity.forecast(&self.collector.snapshot())
    }

    /// Build the full state from a single snapshot.
    pub fn state(&self) -> Result<WeatherState> {
        let snapshot = self.collector.snapshot();
        let observation = snapshot.observation()?;

        Ok(WeatherState {
            name: self.name(),
            unique_id: self.unique_id(),
            attribution: self.attribution().to_string(),
            condition: condition_from_hourly(snapshot.first_hourly()?)?,
            icon: snapshot.first_daily()?.mdi_icon.clone(),
            native_temperature: observation.temp,
            native_temperature_unit: self.native_temperature_unit().to_string(),
            humidity: observation.humidity,
            native_wind_speed: observation.wind_speed_kilometre,
            native_wind_speed_unit: self.native_wind_speed_unit().to_string(),
            wind_bearing: observation.wind_direction.degrees(),
            forecast: self.granularity.forecast(&snapshot)?,
        })
    }

    /// Re-read the collector and publish. Every call writes, even when
    /// nothing changed since the previous one.
    pub fn handle_coordinator_update(&self) {
        let unique_id = self.unique_id();

        match self.state() {
            Ok(state) => {
                tracing::debug!(entity = %unique_id, "publishing weather state");
                self.writer.write_state(&unique_id, &state);
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(entity = %unique_id, error = %err, "weather entity unavailable");
                self.writer.write_unavailable(&unique_id, &err);
            }
            Err(err) => {
                tracing::error!(entity = %unique_id, error = %err, "failed to build weather state");
                self.writer.write_unavailable(&unique_id, &err);
            }
        }
    }

    /// Subscribe to the coordinator and publish the current state once.
    ///
    /// Subscribing is idempotent; a second call does nothing.
    pub fn attach(self: &Arc<Self>) {
        {
            let mut slot = self.listener.lock();
            if slot.is_some() {
                tracing::debug!(entity = %self.unique_id(), "entity already attached");
                return;
            }

            let entity = Arc::downgrade(self);
            *slot = Some(self.coordinator.add_listener(move || {
                if let Some(entity) = entity.upgrade() {
                    entity.handle_coordinator_update();
                }
            }));
        }

        self.handle_coordinator_update();
    }

    /// Drop the coordinator subscription. Safe to call more than once.
    pub fn detach(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.remove();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Ask the coordinator for a refresh; the entity itself does no I/O.
    pub async fn async_update(&self) -> Result<()> {
        self.coordinator.async_refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collector::MemoryCollector,
        model::{Envelope, LocationMetadata, ObservationRecord, WindBearing},
    };

    fn daily(date: &str, icon: &str) -> DailyForecastEntry {
        DailyForecastEntry {
            date: date.into(),
            temp_max: 30.0,
            temp_min: Some(20.0),
            rain_amount_max: Some(5.0),
            rain_chance: Some(40.0),
            icon_descriptor: icon.into(),
            mdi_icon: "mdi:weather-sunny".into(),
        }
    }

    fn hourly(time: &str, icon: &str, is_night: bool) -> HourlyForecastEntry {
        HourlyForecastEntry {
            time: time.into(),
            temp: 24.0,
            rain_amount_max: Some(0.0),
            rain_chance: Some(10.0),
            wind_direction: WindBearing(90.0),
            wind_speed_kilometre: 15.0,
            wind_gust_speed_kilometre: Some(28.0),
            relative_humidity: 55.0,
            uv: Some(3.0),
            icon_descriptor: icon.into(),
            is_night,
        }
    }

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            observations: Some(Envelope {
                data: ObservationRecord {
                    temp: 26.5,
                    humidity: 61.0,
                    wind_speed_kilometre: 13.0,
                    wind_direction: WindBearing(315.0),
                },
            }),
            daily_forecasts: Some(Envelope {
                data: vec![
                    daily("2024-01-10T00:00:00+10:00", "sunny"),
                    daily("2024-01-11T00:00:00+10:00", "storm"),
                ],
            }),
            hourly_forecasts: Some(Envelope {
                data: vec![
                    hourly("2024-01-10T09:00:00Z", "sunny", true),
                    hourly("2024-01-10T10:00:00Z", "partly_cloudy", false),
                ],
            }),
            locations: Some(Envelope {
                data: LocationMetadata {
                    name: "Sydney".into(),
                    timezone: "Australia/Sydney".into(),
                },
            }),
        }
    }

    fn entity(
        granularity: Granularity,
        snapshot: WeatherSnapshot,
    ) -> (Arc<WeatherEntity>, Arc<MemoryCollector>, Arc<StateLog>, Arc<Coordinator>) {
        let collector = Arc::new(MemoryCollector::new(snapshot));
        let coordinator = Arc::new(Coordinator::new("Sydney", collector.clone()));
        let log = Arc::new(StateLog::default());
        let entity =
            Arc::new(WeatherEntity::new(granularity, "Sydney", coordinator.clone(), log.clone()));
        (entity, collector, log, coordinator)
    }

    #[test]
    fn daily_projection_converts_to_location_timezone() {
        let (entity, ..) = entity(Granularity::Daily, snapshot());

        let forecast = entity.forecast().unwrap();
        let first = &forecast[0];

        assert_eq!(first.datetime, "2024-01-10T01:00:00+11:00");
        assert_eq!(first.native_temperature, 30.0);
        assert_eq!(first.templow, Some(20.0));
        assert_eq!(first.native_precipitation, Some(5.0));
        assert_eq!(first.precipitation_probability, Some(40.0));
        assert_eq!(first.condition, Condition::Sunny);
        assert_eq!(first.uv, None);
        assert_eq!(forecast[1].condition, Condition::LightningRainy);
    }

    #[test]
    fn hourly_projection_uses_each_hours_night_flag() {
        let (entity, ..) = entity(Granularity::Hourly, snapshot());

        let forecast = entity.forecast().unwrap();

        assert_eq!(forecast[0].datetime, "2024-01-10T20:00:00+11:00");
        assert_eq!(forecast[0].condition, Condition::ClearNight);
        assert_eq!(forecast[0].wind_bearing, Some(90.0));
        assert_eq!(forecast[0].native_wind_speed, Some(15.0));
        assert_eq!(forecast[0].wind_gust_speed, Some(28.0));
        assert_eq!(forecast[0].humidity, Some(55.0));
        assert_eq!(forecast[0].uv, Some(3.0));
        assert_eq!(forecast[0].templow, None);
        assert_eq!(forecast[1].condition, Condition::PartlyCloudy);
    }

    #[test]
    fn current_condition_comes_from_first_hour_for_both_views() {
        for granularity in Granularity::all() {
            let (entity, ..) = entity(*granularity, snapshot());
            assert_eq!(entity.condition().unwrap(), Condition::ClearNight);
        }
    }

    #[test]
    fn observation_properties_project_directly() {
        let (entity, ..) = entity(Granularity::Daily, snapshot());

        assert_eq!(entity.native_temperature().unwrap(), 26.5);
        assert_eq!(entity.humidity().unwrap(), 61.0);
        assert_eq!(entity.native_wind_speed().unwrap(), 13.0);
        assert_eq!(entity.wind_bearing().unwrap(), 315.0);
        assert_eq!(entity.icon().unwrap(), "mdi:weather-sunny");
        assert_eq!(entity.native_temperature_unit(), "°C");
        assert_eq!(entity.native_wind_speed_unit(), "km/h");
        assert!(!entity.should_poll());
    }

    #[test]
    fn naming_depends_on_granularity() {
        let (daily, ..) = entity(Granularity::Daily, snapshot());
        let (hourly, ..) = entity(Granularity::Hourly, snapshot());

        assert_eq!(daily.name(), "Sydney");
        assert_eq!(daily.unique_id(), "Sydney");
        assert_eq!(hourly.name(), "Sydney Hourly");
        assert_eq!(hourly.unique_id(), "Sydney_hourly");

        let device = hourly.device_info();
        assert_eq!(device.identifiers, vec![(DOMAIN.to_string(), "Sydney".to_string())]);
        assert_eq!(device.manufacturer, SHORT_ATTRIBUTION);
        assert_eq!(device.model, MODEL_NAME);
        assert_eq!(device.name, "Sydney");
        assert_eq!(device.entry_type, DeviceEntryType::Service);
    }

    #[test]
    fn reads_before_population_are_not_ready() {
        let (entity, ..) = entity(Granularity::Daily, WeatherSnapshot::default());

        assert!(matches!(entity.native_temperature(), Err(EntityError::DataNotReady(_))));
        assert!(matches!(entity.icon(), Err(EntityError::DataNotReady(_))));
        assert!(matches!(entity.condition(), Err(EntityError::DataNotReady(_))));
        assert!(matches!(entity.forecast(), Err(EntityError::DataNotReady(_))));
        assert!(matches!(entity.state(), Err(EntityError::DataNotReady(_))));
    }

    #[test]
    fn unmapped_descriptor_propagates() {
        let mut data = snapshot();
        if let Some(daily) = data.daily_forecasts.as_mut() {
            daily.data[1].icon_descriptor = "volcanic_ash".into();
        }
        let (entity, ..) = entity(Granularity::Daily, data);

        let err = entity.forecast().unwrap_err();
        assert!(matches!(err, EntityError::UnmappedCondition(ref code) if code == "volcanic_ash"));
    }

    #[test]
    fn bad_timezone_and_timestamp_are_reported() {
        let mut data = snapshot();
        if let Some(location) = data.locations.as_mut() {
            location.data.timezone = "Australia/Atlantis".into();
        }
        let (entity, ..) = entity(Granularity::Daily, data);
        assert!(matches!(entity.forecast(), Err(EntityError::TimezoneResolution(_))));

        let err = localize_timestamp("tomorrow", chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, EntityError::InvalidTimestamp { ref value, .. } if value == "tomorrow"));
    }

    #[test]
    fn null_forecast_values_pass_through_as_none() {
        let mut data = snapshot();
        if let Some(daily) = data.daily_forecasts.as_mut() {
            daily.data[0].temp_min = None;
            daily.data[0].rain_amount_max = None;
        }
        if let Some(hourly) = data.hourly_forecasts.as_mut() {
            hourly.data[0].uv = None;
            hourly.data[0].wind_gust_speed_kilometre = None;
        }

        let (daily, ..) = entity(Granularity::Daily, data.clone());
        let day = &daily.forecast().unwrap()[0];
        assert_eq!(day.templow, None);
        assert_eq!(day.native_precipitation, None);
        assert_eq!(day.precipitation_probability, Some(40.0));

        let (hourly, ..) = entity(Granularity::Hourly, data);
        let hour = &hourly.forecast().unwrap()[0];
        assert_eq!(hour.uv, None);
        assert_eq!(hour.wind_gust_speed, None);

        let json = serde_json::to_value(daily.state().unwrap()).unwrap();
        assert!(json["forecast"][0].get("templow").is_none());
    }

    #[test]
    fn timestamps_without_offset_are_utc() {
        let sydney = chrono_tz::Australia::Sydney;

        assert_eq!(
            localize_timestamp("2024-01-10T00:00:00", sydney).unwrap(),
            "2024-01-10T11:00:00+11:00"
        );
        assert_eq!(
            localize_timestamp("2024-01-10T00:00:00.250", sydney).unwrap(),
            "2024-01-10T11:00:00.250+11:00"
        );
        assert_eq!(
            localize_timestamp("2024-01-10T00:00", sydney).unwrap(),
            "2024-01-10T11:00:00+11:00"
        );
    }

    #[test]
    fn timestamps_without_seconds_keep_their_offset() {
        let sydney = chrono_tz::Australia::Sydney;

        assert_eq!(
            localize_timestamp("2024-01-10T00:00Z", sydney).unwrap(),
            "2024-01-10T11:00:00+11:00"
        );
        assert_eq!(
            localize_timestamp("2024-01-10T00:00+10:00", sydney).unwrap(),
            "2024-01-10T01:00:00+11:00"
        );
        assert_eq!(
            localize_timestamp("2024-01-10T00:00:00.000Z", sydney).unwrap(),
            "2024-01-10T11:00:00+11:00"
        );
    }

    #[test]
    fn bare_dates_are_midnight_utc() {
        let local = localize_timestamp("2024-07-01", chrono_tz::Australia::Perth).unwrap();
        assert_eq!(local, "2024-07-01T08:00:00+08:00");
    }

    #[test]
    fn every_notification_publishes_even_when_unchanged() {
        let (entity, _, log, coordinator) = entity(Granularity::Daily, snapshot());

        entity.attach();
        coordinator.notify_listeners();
        coordinator.notify_listeners();

        assert_eq!(log.writes_for("Sydney"), 3);
        let entries = log.entries();
        assert_eq!(entries[1], entries[2]);
    }

    #[test]
    fn attach_twice_registers_one_listener() {
        let (entity, _, log, coordinator) = entity(Granularity::Hourly, snapshot());

        entity.attach();
        entity.attach();
        assert_eq!(coordinator.listener_count(), 1);

        coordinator.notify_listeners();
        assert_eq!(log.writes_for("Sydney_hourly"), 2);
    }

    #[test]
    fn detach_stops_publishing() {
        let (entity, _, log, coordinator) = entity(Granularity::Daily, snapshot());

        entity.attach();
        entity.detach();
        entity.detach();
        coordinator.notify_listeners();

        assert!(!entity.is_attached());
        assert_eq!(coordinator.listener_count(), 0);
        assert_eq!(log.writes_for("Sydney"), 1);
    }

    #[test]
    fn empty_collector_publishes_unavailable_then_recovers() {
        let (entity, collector, log, coordinator) =
            entity(Granularity::Daily, WeatherSnapshot::default());

        entity.attach();
        assert!(matches!(log.latest("Sydney"), Some(Published::Unavailable { .. })));

        collector.replace(snapshot());
        coordinator.notify_listeners();

        match log.latest("Sydney") {
            Some(Published::Available { state, .. }) => {
                assert_eq!(state.native_temperature, 26.5);
                assert_eq!(state.forecast.len(), 2);
            }
            other => panic!("expected available state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn async_update_delegates_to_coordinator() {
        let (entity, _, log, _) = entity(Granularity::Daily, snapshot());
        entity.attach();

        entity.async_update().await.unwrap();

        assert_eq!(log.writes_for("Sydney"), 2);
    }

    #[test]
    fn state_serializes_host_field_names() {
        let (entity, ..) = entity(Granularity::Daily, snapshot());

        let json = serde_json::to_value(entity.state().unwrap()).unwrap();

        assert_eq!(json["condition"], "clear-night");
        assert_eq!(json["forecast"][0]["templow"], 20.0);
        assert!(json["forecast"][0].get("uv").is_none());
        assert_eq!(json["attribution"], ATTRIBUTION);
    }
}
