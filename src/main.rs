use anyhow::{Context, Result, anyhow};
use opentelemetry::KeyValue;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

use blockchain_harvester::extraction::NdjsonExtraction;
use blockchain_harvester::harvester;
use blockchain_harvester::metrics::Metrics;
use blockchain_harvester::storage;
use blockchain_harvester::utils::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    println!();
    info!("=========================== INITIALIZING ===========================");

    // Load config
    let config = match load_config("config.yml") {
        Ok(config) => {
            info!("Config loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(anyhow!(e));
        }
    };

    let chain_name = config.chain_name.clone();
    let datasets = config.datasets.clone();

    if config.batch_size == 0 {
        return Err(anyhow!("batch_size must be at least 1"));
    }
    if config.end_block < config.start_block {
        return Err(anyhow!(
            "end_block {} is before start_block {}",
            config.end_block,
            config.start_block
        ));
    }

    // Initialize optional metrics
    let metrics = if config.metrics.enabled {
        Some(Metrics::new(chain_name.clone())?)
    } else {
        info!("Metrics are disabled");
        None
    };

    // Start metrics server if metrics are enabled
    if let Some(metrics_instance) = &metrics {
        metrics_instance
            .start_metrics_server(&config.metrics.address, config.metrics.port)
            .await?;
    }

    // Initialize the warehouse client before doing any work
    storage::dune::init_client(&config.api_url, config.api_key.as_deref())?;

    // Extraction collaborator: reads the extraction tool's per-range files
    let extraction = NdjsonExtraction::new(&config.data_dir, chain_name.as_str());

    println!();
    info!("========================= STARTING HARVESTER =======================");
    info!(
        "Harvesting {} blocks {} to {} in batches of {}",
        chain_name, config.start_block, config.end_block, config.batch_size
    );

    let mut start_block = config.start_block;
    while start_block <= config.end_block {
        let end_block = config
            .end_block
            .min(start_block.saturating_add(config.batch_size - 1));

        // Start timing the batch processing
        let batch_start_time = Instant::now();

        let batch = harvester::process_range(
            &extraction,
            start_block,
            end_block,
            &datasets,
            metrics.as_ref(),
        )
        .await
        .with_context(|| format!("failed to transform blocks {start_block}-{end_block}"))?;

        storage::insert_batch(&chain_name, &batch, &datasets, metrics.as_ref())
            .await
            .with_context(|| format!("failed to insert blocks {start_block}-{end_block}"))?;

        // Calculate batch processing duration
        let batch_processing_duration = batch_start_time.elapsed().as_secs_f64();
        info!(
            "Processed blocks {} to {} in {:.2}s",
            start_block, end_block, batch_processing_duration
        );

        // Update metrics
        if let Some(metrics_instance) = &metrics {
            metrics_instance.batches_processed.add(
                1,
                &[KeyValue::new("chain", metrics_instance.chain_name.clone())],
            );
            metrics_instance.latest_processed_block.record(
                end_block,
                &[KeyValue::new("chain", metrics_instance.chain_name.clone())],
            );
            metrics_instance.batch_processing_time.record(
                batch_processing_duration,
                &[KeyValue::new("chain", metrics_instance.chain_name.clone())],
            );
        }

        start_block = match end_block.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }

    info!(
        "Harvest complete: blocks {} to {}",
        config.start_block, config.end_block
    );
    Ok(())
}
