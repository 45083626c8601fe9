use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use swarm_localization::adapters::outbound::{
    init_buffered_logger, init_combined_logger, init_console_logger, JsonLinesTelemetrySink,
};
use swarm_localization::application::SimulationService;
use swarm_localization::{Config, TelemetrySink};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting swarm localization with {}", path);

    let bridge = match &config.logging.file {
        Some(file) => init_combined_logger(file, &config.logging.level),
        None => init_console_logger(),
    };
    let logger = init_buffered_logger(bridge, config.logging.buffer_capacity);

    let sink = config.logging.telemetry_file.as_ref().map(|file| {
        Arc::new(JsonLinesTelemetrySink::new(file)) as Arc<dyn TelemetrySink + Send + Sync>
    });

    let mut service = SimulationService::new(config, logger, sink)?;
    let duration = Duration::from_secs_f64(service.config().simulation.duration_secs);
    service.start()?;

    tokio::select! {
        _ = tokio::time::sleep(duration) => info!("Run finished after {:?}", duration),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Interrupted");
        }
    }

    for (id, frame) in service.published_frames() {
        let points: Vec<String> = frame
            .iter()
            .map(|(peer, p)| format!("{}=({:.2}, {:.2})", peer, p.x, p.y))
            .collect();
        info!("{} frame: {}", id, points.join(" "));
    }

    let projection = service.stop().await?;
    info!(
        "Shutting down: {} exchanges, {} events",
        projection.total_exchanges(),
        projection.events_applied
    );
    Ok(())
}
