pub mod context;
pub mod ndjson;
pub mod transformations;

use anyhow::Result;
use tracing::info;

use crate::extraction::Extraction;
use crate::harvester::context::TxContextIndex;
use crate::harvester::transformations::{
    blocks::BlockTransformer, logs::LogTransformer, traces::TraceTransformer,
    transactions::TransactionTransformer,
};
use crate::metrics::Metrics;
use crate::models::common::{RawBatch, Table, TransformedBatch};
use crate::models::datasets::blocks::RawBlockRecord;
use crate::models::datasets::logs::RawLogRecord;
use crate::models::datasets::traces::RawTraceRecord;
use crate::models::datasets::transactions::RawTransactionRecord;

pub fn active(datasets: &[String], table: Table) -> bool {
    datasets.iter().any(|dataset| dataset == table.as_str())
}

/// Pull every table one inclusive block range needs. Transactions are
/// extracted whenever logs or traces are active even if the transactions
/// table itself is not: both join against transaction context.
pub async fn extract_range<E: Extraction>(
    extraction: &E,
    start_block: u64,
    end_block: u64,
    datasets: &[String],
) -> Result<RawBatch> {
    let need_transactions = active(datasets, Table::Transactions)
        || active(datasets, Table::Logs)
        || active(datasets, Table::Traces);

    let blocks = if active(datasets, Table::Blocks) {
        extraction.get_blocks(start_block, end_block).await?
    } else {
        Vec::new()
    };
    let transactions = if need_transactions {
        extraction.get_transactions(start_block, end_block).await?
    } else {
        Vec::new()
    };
    let logs = if active(datasets, Table::Logs) {
        extraction.get_logs(start_block, end_block).await?
    } else {
        Vec::new()
    };
    let traces = if active(datasets, Table::Traces) {
        extraction.get_traces(start_block, end_block).await?
    } else {
        Vec::new()
    };

    Ok(RawBatch {
        blocks,
        transactions,
        logs,
        traces,
    })
}

/// Transform one extracted batch into warehouse rows. The transaction
/// context index is built once per batch, then each active dataset's
/// transformer runs over its table.
pub fn transform_batch(
    raw: RawBatch,
    datasets: &[String],
    metrics: Option<&Metrics>,
) -> Result<TransformedBatch> {
    let context = TxContextIndex::build(&raw.transactions);

    let blocks = if active(datasets, Table::Blocks) && !raw.blocks.is_empty() {
        <RawBlockRecord as BlockTransformer>::transform_blocks(raw.blocks)?
    } else {
        Vec::new()
    };

    let logs = if active(datasets, Table::Logs) && !raw.logs.is_empty() {
        <RawLogRecord as LogTransformer>::transform_logs(raw.logs, &context, metrics)?
    } else {
        Vec::new()
    };

    let traces = if active(datasets, Table::Traces) && !raw.traces.is_empty() {
        <RawTraceRecord as TraceTransformer>::transform_traces(raw.traces, &context, metrics)?
    } else {
        Vec::new()
    };

    let transactions = if active(datasets, Table::Transactions) && !raw.transactions.is_empty() {
        <RawTransactionRecord as TransactionTransformer>::transform_transactions(raw.transactions)?
    } else {
        Vec::new()
    };

    Ok(TransformedBatch {
        blocks,
        transactions,
        logs,
        traces,
    })
}

/// Extract and transform one inclusive block range.
pub async fn process_range<E: Extraction>(
    extraction: &E,
    start_block: u64,
    end_block: u64,
    datasets: &[String],
    metrics: Option<&Metrics>,
) -> Result<TransformedBatch> {
    let raw = extract_range(extraction, start_block, end_block, datasets).await?;
    info!(
        "Extracted blocks {}-{}: {} blocks, {} transactions, {} logs, {} traces",
        start_block,
        end_block,
        raw.blocks.len(),
        raw.transactions.len(),
        raw.logs.len(),
        raw.traces.len()
    );
    transform_batch(raw, datasets, metrics)
}
