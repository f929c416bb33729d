pub mod dune;

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use tracing::{debug, info};

use crate::harvester::ndjson::to_ndjson;
use crate::metrics::Metrics;
use crate::models::common::{Table, TransformedBatch};

/// Emit and insert every active table of a transformed batch, in a fixed
/// table order. The first failing insert aborts the batch.
pub async fn insert_batch(
    chain_name: &str,
    batch: &TransformedBatch,
    datasets: &[String],
    metrics: Option<&Metrics>,
) -> Result<()> {
    let client = dune::get_client()?;

    for table in Table::ALL {
        if !crate::harvester::active(datasets, table) {
            continue;
        }

        let (rows, body) = match table {
            Table::Blocks => (batch.blocks.len(), to_ndjson(&batch.blocks)?),
            Table::Transactions => (batch.transactions.len(), to_ndjson(&batch.transactions)?),
            Table::Logs => (batch.logs.len(), to_ndjson(&batch.logs)?),
            Table::Traces => (batch.traces.len(), to_ndjson(&batch.traces)?),
        };
        if rows == 0 {
            debug!("No {} rows in batch, skipping insert", table);
            continue;
        }

        client
            .insert(chain_name, table, body, metrics)
            .await
            .with_context(|| format!("insert into table '{table}' failed"))?;
        info!("Inserted {} rows into {}.{}", rows, chain_name, table);

        if let Some(metrics) = metrics {
            metrics.rows_inserted.add(
                rows as u64,
                &[
                    KeyValue::new("chain", metrics.chain_name.clone()),
                    KeyValue::new("table", table.as_str()),
                ],
            );
        }
    }

    Ok(())
}
