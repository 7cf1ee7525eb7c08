use thiserror::Error;

/// Errors raised while projecting collector data into entity state.
#[derive(Debug, Error)]
pub enum EntityError {
    /// The BOM icon descriptor has no entry in the condition table.
    #[error("No condition mapping for BOM icon descriptor '{0}'")]
    UnmappedCondition(String),

    /// The collector has not populated this section yet.
    #[error("Collector has no {0} data yet")]
    DataNotReady(&'static str),

    #[error("Unknown timezone '{0}' in location metadata")]
    TimezoneResolution(String),

    #[error("Invalid forecast timestamp '{value}'")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Collector update failed: {0:#}")]
    Collector(anyhow::Error),
}

impl EntityError {
    /// Transient errors leave the entity unavailable until the next refresh
    /// instead of signalling a broken configuration.
    pub fn is_transient(&self) -> bool {
        matches!(self, EntityError::DataNotReady(_) | EntityError::Collector(_))
    }
}

pub type Result<T, E = EntityError> = std::result::Result<T, E>;
