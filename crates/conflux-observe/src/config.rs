use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::format::LogFormat;
use crate::level::LogLevel;

/// Tracing bootstrap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// Level filter expression (e.g. "info", "conflux_core=debug,info").
    pub level: LogLevel,
    /// Whether to include module/target names in log output.
    pub with_targets: bool,
    /// Whether to use colored output.
    pub use_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LogConfig {
    /// Determines whether colored output should actually be used.
    ///
    /// Color is enabled only if `use_color` is set and stdout is a terminal,
    /// so the check belongs at initialization time rather than config
    /// parsing time.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
