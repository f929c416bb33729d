use std::sync::Arc;
use tracing::{error, info};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use opentelemetry::metrics::{Counter, Gauge, Histogram, MeterProvider};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;

pub struct Metrics {
    registry: Arc<prometheus::Registry>,
    _provider: SdkMeterProvider,
    pub chain_name: String,

    // Batch processing metrics
    pub batches_processed: Counter<u64>,
    pub latest_processed_block: Gauge<u64>,
    pub batch_processing_time: Gauge<f64>,

    // Warehouse insert metrics
    pub rows_inserted: Counter<u64>,
    pub insert_requests: Counter<u64>,
    pub insert_errors: Counter<u64>,
    pub insert_latency: Histogram<f64>,

    // Data-quality metrics
    pub missing_context: Counter<u64>,
    pub unknown_trace_kinds: Counter<u64>,
}

impl Metrics {
    pub fn new(chain_name: String) -> Result<Self> {
        // Create a new prometheus registry
        let registry = prometheus::Registry::new();

        // Configure OpenTelemetry to use this registry
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        // Set up a meter to create instruments
        let provider = SdkMeterProvider::builder().with_reader(exporter).build();
        let meter = provider.meter("harvester_metrics");

        let batches_processed = meter
            .u64_counter("harvester_batches_processed")
            .with_description("Total number of block-range batches processed")
            .build();

        let latest_processed_block = meter
            .u64_gauge("harvester_latest_processed_block_number")
            .with_description("Latest block number processed")
            .build();

        let batch_processing_time = meter
            .f64_gauge("harvester_latest_batch_processing")
            .with_description("Time spent processing the latest batch")
            .build();

        let rows_inserted = meter
            .u64_counter("harvester_rows_inserted")
            .with_description("Rows appended to the warehouse per table")
            .build();

        let insert_requests = meter
            .u64_counter("harvester_insert_requests")
            .with_description("Number of warehouse insert requests made")
            .build();

        let insert_errors = meter
            .u64_counter("harvester_insert_errors")
            .with_description("Number of warehouse insert errors encountered")
            .build();

        let insert_latency = meter
            .f64_histogram("harvester_insert_latency")
            .with_description("Warehouse insert request latency")
            .with_boundaries(vec![
                0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 5.0, 10.0,
            ])
            .with_unit("s")
            .build();

        let missing_context = meter
            .u64_counter("harvester_missing_context")
            .with_description("Records joined with no matching transaction context")
            .build();

        let unknown_trace_kinds = meter
            .u64_counter("harvester_unknown_trace_kinds")
            .with_description("Traces with an unrecognized operation kind tag")
            .build();

        Ok(Self {
            registry: Arc::new(registry),
            _provider: provider,
            chain_name,
            batches_processed,
            latest_processed_block,
            batch_processing_time,
            rows_inserted,
            insert_requests,
            insert_errors,
            insert_latency,
            missing_context,
            unknown_trace_kinds,
        })
    }

    pub async fn start_metrics_server(&self, addr: &str, port: u16) -> Result<()> {
        let addr = format!("{addr}:{port}")
            .parse::<SocketAddr>()
            .context("invalid metrics server address")?;
        let registry = self.registry.clone();

        let app = Router::new().route("/metrics", get(move || metrics_handler(registry.clone())));

        // Determine the access URL based on the binding address. Only used for logging.
        let access_url = if addr.ip().to_string() == "0.0.0.0" {
            format!("http://localhost:{port}/metrics")
        } else {
            format!("http://{}:{port}/metrics", addr.ip())
        };

        info!(
            "Starting metrics server - binding to {} (accessible at {})",
            addr, access_url
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind metrics server")?;

        // Spawn the server in a separate task
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Metrics server error: {}", e);
            }
        });

        Ok(())
    }
}

async fn metrics_handler(registry: Arc<prometheus::Registry>) -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
