use alloy_primitives::{Address, Bytes, FixedBytes};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::common::utc_time;

///////////////////////////////// Extracted Data ///////////////////////////////////////
#[derive(Debug, Clone, Deserialize)]
pub struct RawLogRecord {
    pub block_number: u64,
    pub block_hash: Option<FixedBytes<32>>,
    pub transaction_index: Option<u64>,
    pub transaction_hash: FixedBytes<32>,
    pub log_index: Option<u64>,
    pub address: Option<Address>,
    pub topic0: Option<FixedBytes<32>>,
    pub topic1: Option<FixedBytes<32>>,
    pub topic2: Option<FixedBytes<32>>,
    pub topic3: Option<FixedBytes<32>>,
    pub data: Option<Bytes>,
    pub n_data_bytes: Option<u64>,
    pub chain_id: Option<u64>,
}

/////////////////////////////////// Transformed Data ///////////////////////////////////
// Final output format. Temporal and address context is joined from the
// transaction batch: block_date/block_time by block number, tx_from/tx_to
// by transaction hash.
#[derive(Debug, Clone, Serialize)]
pub struct TransformedLogRecord {
    pub block_number: u64,
    pub block_hash: Option<FixedBytes<32>>,
    pub block_date: Option<NaiveDate>,
    #[serde(serialize_with = "utc_time::serialize_opt")]
    pub block_time: Option<NaiveDateTime>,
    pub tx_hash: FixedBytes<32>,
    pub tx_index: Option<u64>,
    pub tx_from: Option<Address>,
    pub tx_to: Option<Address>,
    pub index: Option<u64>,
    pub contract_address: Option<Address>,
    pub topic0: Option<FixedBytes<32>>,
    pub topic1: Option<FixedBytes<32>>,
    pub topic2: Option<FixedBytes<32>>,
    pub topic3: Option<FixedBytes<32>>,
    pub data: Option<Bytes>,
}
