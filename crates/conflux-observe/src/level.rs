use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::ObserveError;

/// Validated `EnvFilter` expression used at the configuration layer.
///
/// Stores the raw filter string (e.g. `"info"` or
/// `"conflux_core=trace,info"`), validated with `EnvFilter::try_new` when
/// parsed from config or user input, and converted into an actual filter on
/// demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct LogLevel(String);

impl LogLevel {
    /// Create a level from a string-like value.
    pub fn new(s: impl Into<String>) -> Result<Self, ObserveError> {
        Self::try_from(s.into())
    }

    /// The underlying filter expression, exactly as provided.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the corresponding `EnvFilter`.
    ///
    /// The expression was validated at construction time, so this cannot
    /// fail; an empty filter is used as the unreachable fallback.
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.0).unwrap_or_default()
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ObserveError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        EnvFilter::try_new(&s).map_err(|_| ObserveError::InvalidLevel(s.clone()))?;
        Ok(Self(s))
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> String {
        level.0
    }
}

impl FromStr for LogLevel {
    type Err = ObserveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}
