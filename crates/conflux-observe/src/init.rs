use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;
use crate::error::{ObserveError, ObserveResult};
use crate::format::LogFormat;
use crate::timer::UtcRfc3339;

/// Initialize the global tracing subscriber from the given configuration.
///
/// Once installed, all `tracing` macros (`info!`, `debug!`, etc.) go through
/// this subscriber. A second call fails with
/// [`ObserveError::AlreadyInitialized`].
pub fn init_tracing(cfg: &LogConfig) -> ObserveResult<()> {
    match cfg.format {
        LogFormat::Text => init_text(cfg),
        LogFormat::Json => init_json(cfg),
        LogFormat::Journald => init_journald(cfg),
    }
}

fn init_text(cfg: &LogConfig) -> ObserveResult<()> {
    let filter = cfg.level.to_env_filter();
    let fmt_layer = fmt::layer()
        .with_ansi(cfg.should_use_color())
        .with_target(cfg.with_targets)
        .with_timer(UtcRfc3339);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    install(subscriber)
}

fn init_json(cfg: &LogConfig) -> ObserveResult<()> {
    let filter = cfg.level.to_env_filter();
    let fmt_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(UtcRfc3339);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    install(subscriber)
}

#[cfg(target_os = "linux")]
fn init_journald(cfg: &LogConfig) -> ObserveResult<()> {
    let filter = cfg.level.to_env_filter();
    let journald =
        tracing_journald::layer().map_err(|e| ObserveError::JournaldInitFailed(e.to_string()))?;

    let subscriber = tracing_subscriber::registry().with(filter).with(journald);
    install(subscriber)
}

#[cfg(not(target_os = "linux"))]
fn init_journald(_cfg: &LogConfig) -> ObserveResult<()> {
    Err(ObserveError::JournaldNotSupported)
}

/// Install the subscriber as the global default.
fn install<S>(subscriber: S) -> ObserveResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| ObserveError::AlreadyInitialized)
}
