use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::KeyValue;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::metrics::Metrics;
use crate::models::common::Table;
use crate::models::errors::StorageError;
use crate::utils::retry::{RetryConfig, retry};

// Define a static OnceCell to hold the shared warehouse client.
static DUNE_CLIENT: OnceCell<Arc<DuneClient>> = OnceCell::new();

pub struct DuneClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

// Initializes and caches the shared warehouse client. Called once at
// startup; the API key comes from config or the DUNE_API_KEY environment.
pub fn init_client(api_url: &str, api_key: Option<&str>) -> Result<Arc<DuneClient>> {
    if let Some(client) = DUNE_CLIENT.get() {
        return Ok(client.clone());
    }

    let api_key = api_key
        .map(str::to_owned)
        .or_else(|| std::env::var("DUNE_API_KEY").ok())
        .filter(|key| !key.is_empty())
        .ok_or(StorageError::MissingApiKey)?;
    let base_url = Url::parse(api_url).context("invalid warehouse API URL")?;

    let client = Arc::new(DuneClient {
        http: reqwest::Client::new(),
        base_url,
        api_key,
    });

    match DUNE_CLIENT.set(client.clone()) {
        Ok(()) => {
            info!("Initialized warehouse client for {}", client.base_url);
            Ok(client)
        }
        Err(_) => Ok(DUNE_CLIENT
            .get()
            .cloned()
            .unwrap_or_else(|| client.clone())),
    }
}

pub fn get_client() -> Result<Arc<DuneClient>> {
    DUNE_CLIENT
        .get()
        .cloned()
        .context("warehouse client is not initialized")
}

impl DuneClient {
    fn insert_url(&self, chain_name: &str, table: Table) -> Result<Url> {
        self.base_url
            .join(&format!(
                "api/v1/blockchain/{chain_name}/{table}/insert"
            ))
            .context("failed to build insert URL")
    }

    /// Bulk-append one table's NDJSON payload. The endpoint is an append
    /// keyed by (chain, table) and re-sending the same block range is safe,
    /// so the whole call sits inside the retry loop.
    pub async fn insert(
        &self,
        chain_name: &str,
        table: Table,
        body: String,
        metrics: Option<&Metrics>,
    ) -> Result<()> {
        let url = self.insert_url(chain_name, table)?;
        let retry_config = RetryConfig::default();

        retry(
            || async {
                let start = std::time::Instant::now();

                if let Some(metrics) = metrics {
                    metrics.insert_requests.add(
                        1,
                        &[
                            KeyValue::new("chain", metrics.chain_name.clone()),
                            KeyValue::new("table", table.as_str()),
                        ],
                    );
                }

                let result = self
                    .http
                    .post(url.clone())
                    .header("X-DUNE-API-KEY", &self.api_key)
                    .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
                    .body(body.clone())
                    .send()
                    .await;

                if let Some(metrics) = metrics {
                    metrics.insert_latency.record(
                        start.elapsed().as_secs_f64(),
                        &[
                            KeyValue::new("chain", metrics.chain_name.clone()),
                            KeyValue::new("table", table.as_str()),
                        ],
                    );
                }

                let response = match result {
                    Ok(response) => response,
                    Err(e) => {
                        if let Some(metrics) = metrics {
                            metrics.insert_errors.add(
                                1,
                                &[
                                    KeyValue::new("chain", metrics.chain_name.clone()),
                                    KeyValue::new("table", table.as_str()),
                                ],
                            );
                        }
                        return Err(anyhow!("warehouse request error: {}", e));
                    }
                };

                let status = response.status();
                if status.is_success() {
                    return Ok(());
                }

                if let Some(metrics) = metrics {
                    metrics.insert_errors.add(
                        1,
                        &[
                            KeyValue::new("chain", metrics.chain_name.clone()),
                            KeyValue::new("table", table.as_str()),
                        ],
                    );
                }
                let body = response.text().await.unwrap_or_default();
                Err(StorageError::InsertRejected {
                    table: table.to_string(),
                    status: status.as_u16(),
                    body,
                }
                .into())
            },
            &retry_config,
            "warehouse_insert",
        )
        .await
    }
}
