use alloy_primitives::{Address, Bytes, FixedBytes};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::common::utc_time;

///////////////////////////////// Extracted Data ///////////////////////////////////////
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransactionRecord {
    pub block_number: u64,
    pub transaction_index: Option<u64>,
    pub transaction_hash: FixedBytes<32>,
    pub timestamp: u64,
    pub nonce: Option<u64>,
    pub from_address: Option<Address>,
    pub to_address: Option<Address>,
    pub value_string: Option<String>,
    pub value_binary: Option<Bytes>,
    pub value_f64: Option<f64>,
    pub input: Option<Bytes>,
    pub gas_limit: Option<u64>,
    pub gas_used: Option<u64>,
    pub gas_price: Option<u64>,
    pub transaction_type: Option<u32>,
    pub max_fee_per_gas: Option<u64>,
    pub max_priority_fee_per_gas: Option<u64>,
    pub success: Option<bool>,
    pub n_input_bytes: Option<u64>,
    pub n_input_zero_bytes: Option<u64>,
    pub n_input_nonzero_bytes: Option<u64>,
    pub chain_id: Option<u64>,
}

/////////////////////////////////// Transformed Data ///////////////////////////////////
// Final output format. `value` stays a decimal string: the warehouse
// transactions schema takes it as text, unlike the traces table.
#[derive(Debug, Clone, Serialize)]
pub struct TransformedTransactionRecord {
    pub block_number: u64,
    pub block_date: NaiveDate,
    #[serde(serialize_with = "utc_time::serialize")]
    pub block_time: NaiveDateTime,
    pub index: Option<u64>,
    pub hash: FixedBytes<32>,
    pub nonce: Option<u64>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<String>,
    pub data: Option<Bytes>,
    pub gas_limit: Option<u64>,
    pub gas_used: Option<u64>,
    pub gas_price: Option<u64>,
    pub r#type: Option<u32>,
    pub max_fee_per_gas: Option<u64>,
    pub max_priority_fee_per_gas: Option<u64>,
    pub success: Option<bool>,
    pub chain_id: Option<u64>,
}
