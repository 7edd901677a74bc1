use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Merge concurrency applied when no explicit limit is configured.
pub const DEFAULT_MERGE_LIMIT: usize = 4;

/// Bound on how many sources a merge may pull from concurrently.
///
/// Always at least 1. A limit of 1 drains sources one after another in
/// submission order; a limit at or above the number of sources pulls from
/// all of them at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize")]
#[serde(into = "usize")]
pub struct Limit(usize);

impl Limit {
    /// Create a limit, rejecting zero.
    pub fn new(value: usize) -> ModelResult<Self> {
        if value == 0 {
            return Err(ModelError::InvalidLimit("must be at least 1".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the raw value.
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(DEFAULT_MERGE_LIMIT)
    }
}

impl TryFrom<usize> for Limit {
    type Error = ModelError;

    fn try_from(value: usize) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<Limit> for usize {
    fn from(limit: Limit) -> usize {
        limit.0
    }
}

impl FromStr for Limit {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidLimit(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
