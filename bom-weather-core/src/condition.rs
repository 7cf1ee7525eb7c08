//! Translation of BOM icon descriptors into host weather conditions.

use serde::{Deserialize, Serialize};

use crate::{
    error::{EntityError, Result},
    model::HourlyForecastEntry,
};

/// Normalized weather condition understood by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    ClearNight,
    Cloudy,
    Exceptional,
    Fog,
    Hail,
    Lightning,
    LightningRainy,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    Pouring,
    Rainy,
    Snowy,
    SnowyRainy,
    Sunny,
    Windy,
    WindyVariant,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::ClearNight => "clear-night",
            Condition::Cloudy => "cloudy",
            Condition::Exceptional => "exceptional",
            Condition::Fog => "fog",
            Condition::Hail => "hail",
            Condition::Lightning => "lightning",
            Condition::LightningRainy => "lightning-rainy",
            Condition::PartlyCloudy => "partlycloudy",
            Condition::Pouring => "pouring",
            Condition::Rainy => "rainy",
            Condition::Snowy => "snowy",
            Condition::SnowyRainy => "snowy-rainy",
            Condition::Sunny => "sunny",
            Condition::Windy => "windy",
            Condition::WindyVariant => "windy-variant",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BOM icon descriptor → host condition.
pub const MAP_CONDITION: &[(&str, Condition)] = &[
    ("clear", Condition::ClearNight),
    ("cloudy", Condition::Cloudy),
    ("cyclone", Condition::Exceptional),
    ("dust", Condition::Fog),
    ("dusty", Condition::Fog),
    ("fog", Condition::Fog),
    ("frost", Condition::Snowy),
    ("haze", Condition::Fog),
    ("hazy", Condition::Fog),
    ("heavy_shower", Condition::Pouring),
    ("heavy_showers", Condition::Pouring),
    ("light_rain", Condition::Rainy),
    ("light_shower", Condition::Rainy),
    ("light_showers", Condition::Rainy),
    ("mostly_sunny", Condition::Sunny),
    ("partly_cloudy", Condition::PartlyCloudy),
    ("rain", Condition::Rainy),
    ("shower", Condition::Rainy),
    ("showers", Condition::Rainy),
    ("snow", Condition::Snowy),
    ("storm", Condition::LightningRainy),
    ("storms", Condition::LightningRainy),
    ("sunny", Condition::Sunny),
    ("tropical_cyclone", Condition::Exceptional),
    ("wind", Condition::Windy),
    ("windy", Condition::Windy),
];

/// Night-time aliases for descriptors that BOM keeps using after sunset.
/// An hourly `sunny` with `is_night` set means a clear night.
pub const MAP_NIGHT_CONDITION: &[(&str, &str)] = &[
    ("sunny", "clear"),
    ("mostly_sunny", "partly_cloudy"),
];

fn lookup(icon_descriptor: &str) -> Option<Condition> {
    MAP_CONDITION
        .iter()
        .find(|(code, _)| *code == icon_descriptor)
        .map(|(_, condition)| *condition)
}

/// Resolve a night alias. Descriptors without an alias stand for themselves.
pub fn night_alias(icon_descriptor: &str) -> &str {
    MAP_NIGHT_CONDITION
        .iter()
        .find(|(code, _)| *code == icon_descriptor)
        .map_or(icon_descriptor, |(_, alias)| *alias)
}

/// Map a BOM icon descriptor to a host condition.
///
/// Unknown descriptors are an error, never a guessed default.
pub fn map_condition(icon_descriptor: &str, is_night: bool) -> Result<Condition> {
    let code = if is_night { night_alias(icon_descriptor) } else { icon_descriptor };

    lookup(code).ok_or_else(|| EntityError::UnmappedCondition(code.to_string()))
}

/// Condition of a single forecast hour, honouring its own day/night flag.
pub fn condition_from_hourly(entry: &HourlyForecastEntry) -> Result<Condition> {
    map_condition(&entry.icon_descriptor, entry.is_night)
}
