use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use pipeline_rtsp_client::{
    serve_metrics, Config, GStreamerEngine, PipelineBuilder, PrometheusReporter, RunOutcome,
    StreamPipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();
    config.validate()?;

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Initialize GStreamer (infrastructure concern)
    gstreamer::init()?;
    GStreamerEngine::apply_debug_level(config.debug_level());

    // Initialize metrics
    PrometheusReporter::init_metrics()?;

    info!("Starting RTSP client pipeline");
    if config.uses_default_arguments() {
        info!("  No arguments given, using built-in defaults");
    }
    info!("  RTSP source: {}", config.source_address());
    info!("  Codec: {}", config.codec_hint());
    info!("  Debug level: {}", config.debug_level());
    info!("  Display: {}", config.display_enabled());
    info!("  Platform: {}", config.platform_class());
    info!("  Metrics port: {}", config.metrics_port);

    // Convert CLI config to domain config
    let pipeline_config = config
        .to_pipeline_config()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // Element creation talks to the GStreamer registry, keep it off the runtime
    let pipeline = tokio::task::spawn_blocking(move || {
        let engine = GStreamerEngine::new("rtsp-client-pipeline");
        let metrics_reporter = Arc::new(PrometheusReporter::new());
        StreamPipeline::build(pipeline_config, engine, metrics_reporter)
    })
    .await?
    .map_err(|e| anyhow::anyhow!("{}", e))?;
    let pipeline = Arc::new(pipeline);

    debug!(
        "Pipeline: {}",
        PipelineBuilder::build_launch_string(pipeline.graph())
    );
    debug!(
        "Topology: {}",
        serde_json::to_string(&pipeline.graph().summary())?
    );

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let shutdown_tx = Arc::new(tokio::sync::Mutex::new(Some(shutdown_tx)));

    // Handle Ctrl+C
    let pipeline_for_signal = Arc::clone(&pipeline);
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                let pipeline = Arc::clone(&pipeline_for_signal);
                if let Err(e) = tokio::task::spawn_blocking(move || pipeline.shutdown()).await {
                    error!("Shutdown task failed: {}", e);
                }
                if let Some(tx) = shutdown_tx_clone.lock().await.take() {
                    let _ = tx.send(());
                }
            }
            Err(err) => {
                error!("Failed to listen for shutdown signal: {}", err);
            }
        }
    });

    // Start metrics server
    let metrics_server = tokio::spawn(serve_metrics(
        config.metrics_port,
        pipeline.graph().summary(),
        shutdown_rx,
    ));

    // Run pipeline in a blocking thread (GStreamer uses synchronous APIs)
    let pipeline_for_run = Arc::clone(&pipeline);
    let outcome = tokio::task::spawn_blocking(move || pipeline_for_run.run_to_completion()).await?;

    // Signal shutdown to metrics server
    if let Some(tx) = shutdown_tx.lock().await.take() {
        let _ = tx.send(());
    }

    // Wait for metrics server to shut down
    metrics_server.await?;

    match outcome {
        Ok(RunOutcome::EndOfStream) => info!("Stream ended"),
        Ok(RunOutcome::Stopped) => info!("Pipeline stopped"),
        Err(e) => {
            error!("Pipeline error: {}", e);
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    info!("Pipeline shutdown complete");
    Ok(())
}
