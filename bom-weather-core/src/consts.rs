//! Identifiers and display strings shared by every BOM weather entity.

/// Integration domain, used as the namespace of device identifiers.
pub const DOMAIN: &str = "bureau_of_meteorology";

pub const ATTRIBUTION: &str = "Data provided by the Australian Bureau of Meteorology";
pub const SHORT_ATTRIBUTION: &str = "Australian Bureau of Meteorology";
pub const MODEL_NAME: &str = "Weather Forecast";

/// Location name used when neither the entry options nor its data carry one.
pub const DEFAULT_WEATHER_NAME: &str = "Home";

pub const TEMP_CELSIUS: &str = "°C";
pub const SPEED_KILOMETERS_PER_HOUR: &str = "km/h";
