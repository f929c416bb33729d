use alloy_primitives::{Address, Bytes, FixedBytes};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::common::utc_time;

///////////////////////////////// Extracted Data ///////////////////////////////////////
// Raw extraction-tool row. Column names follow the tool's blocks schema.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlockRecord {
    pub block_number: u64,
    pub block_hash: Option<FixedBytes<32>>,
    pub parent_hash: Option<FixedBytes<32>>,
    pub timestamp: u64,
    pub author: Option<Address>,
    pub gas_limit: Option<u64>,
    pub gas_used: Option<u64>,
    pub extra_data: Option<Bytes>,
    pub base_fee_per_gas: Option<u64>,
    pub logs_bloom: Option<Bytes>,
    pub size: Option<u64>,
    pub nonce: Option<String>,
    // The tool materializes total difficulty in three encodings; only the
    // decimal string survives transformation.
    pub total_difficulty_string: Option<String>,
    pub total_difficulty_binary: Option<Bytes>,
    pub total_difficulty_f64: Option<f64>,
    pub chain_id: Option<u64>,
}

/////////////////////////////////// Transformed Data ///////////////////////////////////
// Final output format. The blocks table uses bare `date`/`time` column
// names; every other table uses `block_date`/`block_time`.
#[derive(Debug, Clone, Serialize)]
pub struct TransformedBlockRecord {
    pub number: u64,
    pub hash: Option<FixedBytes<32>>,
    pub parent_hash: Option<FixedBytes<32>>,
    pub miner: Option<Address>,
    pub gas_limit: Option<u64>,
    pub gas_used: Option<u64>,
    pub extra_data: Option<Bytes>,
    pub base_fee_per_gas: Option<u64>,
    pub logs_bloom: Option<Bytes>,
    pub size: Option<u64>,
    pub nonce: Option<String>,
    pub total_difficulty: Option<String>,
    pub date: NaiveDate,
    #[serde(serialize_with = "utc_time::serialize")]
    pub time: NaiveDateTime,
}
