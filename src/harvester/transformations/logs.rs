use anyhow::Result;
use opentelemetry::KeyValue;
use tracing::warn;

use super::utc_date_time;
use crate::harvester::context::TxContextIndex;
use crate::metrics::Metrics;
use crate::models::datasets::logs::{RawLogRecord, TransformedLogRecord};

pub trait LogTransformer {
    fn transform_logs(
        logs: Vec<RawLogRecord>,
        context: &TxContextIndex,
        metrics: Option<&Metrics>,
    ) -> Result<Vec<TransformedLogRecord>>;
}

impl LogTransformer for RawLogRecord {
    fn transform_logs(
        logs: Vec<RawLogRecord>,
        context: &TxContextIndex,
        metrics: Option<&Metrics>,
    ) -> Result<Vec<TransformedLogRecord>> {
        let mut missing_context: u64 = 0;

        let records = logs
            .into_iter()
            .map(|log| {
                let block_context = context.block_context(log.block_number);
                let addresses = context.tx_addresses(&log.transaction_hash);
                if block_context.is_none() || addresses.is_none() {
                    missing_context += 1;
                }

                let (block_date, block_time) = match block_context {
                    Some(ctx) => {
                        let (date, time) = utc_date_time(ctx.timestamp)?;
                        (Some(date), Some(time))
                    }
                    None => (None, None),
                };

                Ok(TransformedLogRecord {
                    block_number: log.block_number,
                    block_hash: log.block_hash,
                    block_date,
                    block_time,
                    tx_hash: log.transaction_hash,
                    tx_index: log.transaction_index,
                    tx_from: addresses.and_then(|(from, _)| from),
                    tx_to: addresses.and_then(|(_, to)| to),
                    index: log.log_index,
                    contract_address: log.address,
                    topic0: log.topic0,
                    topic1: log.topic1,
                    topic2: log.topic2,
                    topic3: log.topic3,
                    data: log.data,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if missing_context > 0 {
            warn!(
                "{} logs had no matching transaction context and were emitted with null joins",
                missing_context
            );
            if let Some(metrics) = metrics {
                metrics.missing_context.add(
                    missing_context,
                    &[
                        KeyValue::new("chain", metrics.chain_name.clone()),
                        KeyValue::new("table", "logs"),
                    ],
                );
            }
        }

        Ok(records)
    }
}
