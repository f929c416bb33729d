use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::models::common::Table;
use crate::models::datasets::blocks::RawBlockRecord;
use crate::models::datasets::logs::RawLogRecord;
use crate::models::datasets::traces::RawTraceRecord;
use crate::models::datasets::transactions::RawTransactionRecord;

/// Boundary to the chain-data extraction tool: hands back the raw tabular
/// records for an inclusive block range, one method per table. How the data
/// came off the chain (RPC, node files, a third-party service) is the
/// collaborator's concern, as are its failure modes.
pub trait Extraction {
    async fn get_blocks(&self, start_block: u64, end_block: u64) -> Result<Vec<RawBlockRecord>>;
    async fn get_transactions(
        &self,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<RawTransactionRecord>>;
    async fn get_logs(&self, start_block: u64, end_block: u64) -> Result<Vec<RawLogRecord>>;
    async fn get_traces(&self, start_block: u64, end_block: u64) -> Result<Vec<RawTraceRecord>>;
}

/// Reads the NDJSON files the extraction tool materializes per table and
/// range: `<data_dir>/<chain>__<table>__<start:08>_to_<end:08>.json`.
pub struct NdjsonExtraction {
    data_dir: PathBuf,
    chain_name: String,
}

impl NdjsonExtraction {
    pub fn new(data_dir: impl AsRef<Path>, chain_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            chain_name: chain_name.into(),
        }
    }

    fn table_path(&self, table: Table, start_block: u64, end_block: u64) -> PathBuf {
        self.data_dir.join(format!(
            "{}__{}__{:08}_to_{:08}.json",
            self.chain_name, table, start_block, end_block
        ))
    }

    async fn read_table<T: DeserializeOwned>(
        &self,
        table: Table,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<T>> {
        let path = self.table_path(table, start_block, end_block);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read extracted {} file {}", table, path.display()))?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_number, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!(
                        "malformed {} record at {}:{}",
                        table,
                        path.display(),
                        line_number + 1
                    )
                })
            })
            .collect()
    }
}

impl Extraction for NdjsonExtraction {
    async fn get_blocks(&self, start_block: u64, end_block: u64) -> Result<Vec<RawBlockRecord>> {
        self.read_table(Table::Blocks, start_block, end_block).await
    }

    async fn get_transactions(
        &self,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<RawTransactionRecord>> {
        self.read_table(Table::Transactions, start_block, end_block)
            .await
    }

    async fn get_logs(&self, start_block: u64, end_block: u64) -> Result<Vec<RawLogRecord>> {
        self.read_table(Table::Logs, start_block, end_block).await
    }

    async fn get_traces(&self, start_block: u64, end_block: u64) -> Result<Vec<RawTraceRecord>> {
        self.read_table(Table::Traces, start_block, end_block).await
    }
}
