use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::datasets::blocks::{RawBlockRecord, TransformedBlockRecord};
use crate::models::datasets::logs::{RawLogRecord, TransformedLogRecord};
use crate::models::datasets::traces::{RawTraceRecord, TransformedTraceRecord};
use crate::models::datasets::transactions::{RawTransactionRecord, TransformedTransactionRecord};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub chain_name: String,
    pub start_block: u64,
    pub end_block: u64,
    pub batch_size: u64,
    pub data_dir: String,
    pub api_url: String,
    // Injected from the DUNE_API_KEY environment variable, never the file
    pub api_key: Option<String>,
    pub datasets: Vec<String>,
    pub metrics: MetricsConfig,
}

/// Warehouse tables the harvester can populate. The name doubles as the
/// dataset key in config and the table segment of the insert endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Blocks,
    Transactions,
    Logs,
    Traces,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Blocks,
        Table::Transactions,
        Table::Logs,
        Table::Traces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Blocks => "blocks",
            Table::Transactions => "transactions",
            Table::Logs => "logs",
            Table::Traces => "traces",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric column as delivered by the extraction tool. Depending on the
/// tool's schema version the same column arrives as a decimal string, a
/// float string, or a JSON number, so the raw token is kept until the
/// trace normalizer coerces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuantity(pub serde_json::Value);

/// One block range's raw tables, as handed over by the extraction collaborator.
#[derive(Debug, Default)]
pub struct RawBatch {
    pub blocks: Vec<RawBlockRecord>,
    pub transactions: Vec<RawTransactionRecord>,
    pub logs: Vec<RawLogRecord>,
    pub traces: Vec<RawTraceRecord>,
}

/// One block range's warehouse-ready rows.
#[derive(Debug, Default)]
pub struct TransformedBatch {
    pub blocks: Vec<TransformedBlockRecord>,
    pub transactions: Vec<TransformedTransactionRecord>,
    pub logs: Vec<TransformedLogRecord>,
    pub traces: Vec<TransformedTraceRecord>,
}

/// Serializes `Option<U256>` as an exact decimal JSON number. The default
/// alloy representation is a hex string, which the warehouse rejects for
/// integer columns; values can exceed 64 bits so the number token is built
/// from the decimal rendering.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{Serialize, Serializer};
    use std::str::FromStr;

    pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serde_json::Number::from_str(&value.to_string())
                .map_err(serde::ser::Error::custom)?
                .serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// Serializes timestamps in the `YYYY-MM-DD HH:MM:SS` form the warehouse
/// expects for time columns (chrono's default is ISO-8601 with a `T`).
pub mod utc_time {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn serialize_opt<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }
}
