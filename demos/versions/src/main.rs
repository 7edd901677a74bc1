use async_trait::async_trait;
use tracing::info;

use conflux_core::prelude::*;
use conflux_model::{ExecContext, Limit};
use conflux_observe::{LogConfig, LogLevel, init_tracing};

/// Console printer standing in for a real item consumer.
struct ConsoleSink;

#[async_trait]
impl ItemSink<(String, String)> for ConsoleSink {
    async fn deliver(&mut self, (feed, version): (String, String)) {
        println!("- {feed}");
        println!("  {version}");
    }
}

/// In-memory stand-in for an adapter-backed version feed.
fn feed(name: &str, versions: &[&str]) -> BoxSequence<(String, String)> {
    let name = name.to_string();
    IterSequence::new(
        versions
            .iter()
            .map(|v| (name.clone(), v.to_string()))
            .collect::<Vec<_>>(),
    )
    .boxed()
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) logger
    let cfg = LogConfig {
        level: LogLevel::new("info")?,
        ..Default::default()
    };
    init_tracing(&cfg)?;
    info!("tracing initialized");

    // 2) explicit scheduler, owned by this main
    let scheduler = Scheduler::current();

    // 3) version feeds to aggregate
    let sources = vec![
        feed(
            "org.jetbrains.kotlinx:kotlinx-coroutines-core",
            &["1.10.2"],
        ),
        feed("org.eclipse.jetty:jetty-server", &["9.4.57.v20241219"]),
        feed("com.google.guava:guava", &["33.4.8-jre"]),
        feed("com.fasterxml.jackson.core:jackson-core", &["2.19.2"]),
        feed("org.slf4j:slf4j-api", &["1.7.36"]),
        feed("Gradle", &["8.14.3", "9.0.0", "9.1.0-rc-1"]),
        feed("NodeJs", &["22.18.0", "24.5.0"]),
    ];
    info!(feeds = sources.len(), "feeds configured");

    println!("Latest Versions");
    println!("===============");
    println!();

    // 4) merge feeds under the default concurrency limit
    let merged = merge(
        &scheduler,
        ExecContext::named("latest-versions"),
        sources,
        Limit::default(),
    );

    // 5) pump the aggregate through a completion handle onto the console
    let handle = drive(
        &scheduler,
        ExecContext::named("print-versions"),
        merged,
        ConsoleSink,
    );
    handle.join().await?;

    info!("all feeds drained");
    Ok(())
}
