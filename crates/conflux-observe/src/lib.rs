mod config;
pub use config::LogConfig;

mod error;
pub use error::{ObserveError, ObserveResult};

mod format;
pub use format::LogFormat;

mod level;
pub use level::LogLevel;

mod timer;
pub use timer::UtcRfc3339;

mod init;
pub use init::init_tracing;
