//! Loki Exporter - Binary Entry Point

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use loki_exporter::client::LokiClient;
use loki_exporter::config::Config;
use loki_exporter::logging;
use loki_exporter::scheduler::Scheduler;

type MainResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> MainResult<()> {
    let config = Config::parse();
    logging::init(config.debug)?;
    config.validate()?;
    config.log_summary();

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    ctrlc::set_handler(move || {
        info!("shutdown requested");
        shutdown.cancel();
    })?;

    let client = LokiClient::new(&config.loki_addr, config.query.clone(), config.query_timeout())?;
    let scheduler = Scheduler::new(
        client,
        config.checkpoint_store(),
        config.output_layout(),
        config.export_config(),
        config.schedule_interval(),
    );

    if config.once {
        scheduler.run_once(&cancel).await?;
    } else {
        scheduler.run(cancel).await;
    }

    Ok(())
}
