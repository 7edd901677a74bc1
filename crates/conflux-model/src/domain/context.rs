use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Env;

/// Opaque execution context propagated through bridge and merge operations.
///
/// The context is caller-owned data: a name that shows up in diagnostics and
/// an [`Env`] that rides along unchanged. The core never interprets either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecContext {
    name: String,
    env: Env,
}

impl ExecContext {
    /// Create a context with the given name and an empty environment.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            env: Env::new(),
        }
    }

    /// Create a context with the given name and environment.
    pub fn new(name: impl Into<String>, env: Env) -> Self {
        Self {
            name: name.into(),
            env,
        }
    }

    /// Name used in logs and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the attached environment.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Replace the environment and return the updated context.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }
}

impl fmt::Display for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecContext(name={}, env_len={})",
            self.name,
            self.env.len()
        )
    }
}
