use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{EntityError, Result};

/// The `{ "data": ... }` wrapper BOM puts around every payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Wind direction in degrees.
///
/// BOM reports either a number or a 16-point compass string; both
/// deserialize into degrees, anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WindBearing(pub f64);

impl WindBearing {
    pub fn degrees(&self) -> f64 {
        self.0
    }

    pub fn from_compass(point: &str) -> Option<Self> {
        let degrees = match point.to_ascii_uppercase().as_str() {
            "N" | "CALM" => 0.0,
            "NNE" => 22.5,
            "NE" => 45.0,
            "ENE" => 67.5,
            "E" => 90.0,
            "ESE" => 112.5,
            "SE" => 135.0,
            "SSE" => 157.5,
            "S" => 180.0,
            "SSW" => 202.5,
            "SW" => 225.0,
            "WSW" => 247.5,
            "W" => 270.0,
            "WNW" => 292.5,
            "NW" => 315.0,
            "NNW" => 337.5,
            _ => return None,
        };

        Some(WindBearing(degrees))
    }
}

impl<'de> Deserialize<'de> for WindBearing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Degrees(f64),
            Compass(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Degrees(degrees) => Ok(WindBearing(degrees)),
            Raw::Compass(point) => WindBearing::from_compass(&point)
                .ok_or_else(|| de::Error::custom(format!("unknown wind direction '{point}'"))),
        }
    }
}

/// Accepts `null` but, unlike a plain `Option` field, still requires the key.
fn nullable<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)
}

/// Latest station observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Air temperature in °C.
    pub temp: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    pub wind_speed_kilometre: f64,
    pub wind_direction: WindBearing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastEntry {
    /// ISO-8601 timestamp of the start of the forecast day.
    pub date: String,
    pub temp_max: f64,
    /// `null` once today's minimum has passed.
    #[serde(deserialize_with = "nullable")]
    pub temp_min: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub rain_amount_max: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub rain_chance: Option<f64>,
    pub icon_descriptor: String,
    /// Pre-rendered `mdi:` icon reference supplied by the collector.
    pub mdi_icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecastEntry {
    /// ISO-8601 timestamp of the forecast hour.
    pub time: String,
    pub temp: f64,
    #[serde(deserialize_with = "nullable")]
    pub rain_amount_max: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub rain_chance: Option<f64>,
    pub wind_direction: WindBearing,
    pub wind_speed_kilometre: f64,
    #[serde(deserialize_with = "nullable")]
    pub wind_gust_speed_kilometre: Option<f64>,
    pub relative_humidity: f64,
    #[serde(deserialize_with = "nullable")]
    pub uv: Option<f64>,
    pub icon_descriptor: String,
    pub is_night: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMetadata {
    pub name: String,
    /// IANA timezone identifier, e.g. `Australia/Sydney`.
    pub timezone: String,
}

impl LocationMetadata {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| EntityError::TimezoneResolution(self.timezone.clone()))
    }
}

/// Everything the collector knows after its latest refresh.
///
/// A section the collector has not populated yet is `None`. Snapshots are
/// replaced wholesale on refresh and never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<Envelope<ObservationRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_forecasts: Option<Envelope<Vec<DailyForecastEntry>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_forecasts: Option<Envelope<Vec<HourlyForecastEntry>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Envelope<LocationMetadata>>,
}

impl WeatherSnapshot {
    pub fn observation(&self) -> Result<&ObservationRecord> {
        self.observations
            .as_ref()
            .map(|env| &env.data)
            .ok_or(EntityError::DataNotReady("observations"))
    }

    pub fn daily(&self) -> Result<&[DailyForecastEntry]> {
        self.daily_forecasts
            .as_ref()
            .map(|env| env.data.as_slice())
            .ok_or(EntityError::DataNotReady("daily forecast"))
    }

    pub fn hourly(&self) -> Result<&[HourlyForecastEntry]> {
        self.hourly_forecasts
            .as_ref()
            .map(|env| env.data.as_slice())
            .ok_or(EntityError::DataNotReady("hourly forecast"))
    }

    pub fn location(&self) -> Result<&LocationMetadata> {
        self.locations
            .as_ref()
            .map(|env| &env.data)
            .ok_or(EntityError::DataNotReady("location"))
    }

    /// The soonest forecast day. An empty list counts as not ready.
    pub fn first_daily(&self) -> Result<&DailyForecastEntry> {
        self.daily()?
            .first()
            .ok_or(EntityError::DataNotReady("daily forecast"))
    }

    /// The soonest forecast hour. An empty list counts as not ready.
    pub fn first_hourly(&self) -> Result<&HourlyForecastEntry> {
        self.hourly()?
            .first()
            .ok_or(EntityError::DataNotReady("hourly forecast"))
    }
}
