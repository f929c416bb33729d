use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::common::{RawQuantity, u256_decimal, utc_time};

///////////////////////////////// Extracted Data ///////////////////////////////////////
// Raw extraction-tool row for one EVM sub-operation. The `action_*` and
// `result_*` columns change meaning with the operation kind, so every
// kind-dependent field is optional and the kind overlay decides which
// survive (see `TraceKind::overlay`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawTraceRecord {
    pub block_number: u64,
    pub block_hash: Option<FixedBytes<32>>,
    pub transaction_hash: Option<FixedBytes<32>>,
    pub transaction_index: Option<u64>,
    pub action_type: Option<String>,
    pub action_call_type: Option<String>,
    pub action_from: Option<Address>,
    pub action_to: Option<Address>,
    pub action_value: Option<RawQuantity>,
    pub action_gas: Option<RawQuantity>,
    pub action_input: Option<Bytes>,
    pub action_init: Option<Bytes>,
    pub action_reward_type: Option<String>,
    pub result_gas_used: Option<RawQuantity>,
    pub result_output: Option<Bytes>,
    pub result_code: Option<Bytes>,
    pub result_address: Option<Address>,
    pub subtraces: Option<u64>,
    // Underscore-joined child-call indices, e.g. "0_2_1"; empty at the root
    pub trace_address: Option<String>,
    pub error: Option<String>,
    pub chain_id: Option<u64>,
}

/// Operation kind of a trace, parsed case-insensitively from the raw tag.
/// Tags outside the known set pass through as `Unknown` and emit a
/// detail-free row rather than failing the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceKind {
    Call,
    DelegateCall,
    StaticCall,
    CallCode,
    Create,
    Create2,
    SelfDestruct,
    Invalid,
    Stop,
    Unknown(String),
}

impl TraceKind {
    pub fn parse(tag: &str) -> Self {
        match tag.to_uppercase().as_str() {
            "CALL" => Self::Call,
            "DELEGATECALL" => Self::DelegateCall,
            "STATICCALL" => Self::StaticCall,
            "CALLCODE" => Self::CallCode,
            "CREATE" => Self::Create,
            "CREATE2" => Self::Create2,
            "SELFDESTRUCT" => Self::SelfDestruct,
            "INVALID" => Self::Invalid,
            "STOP" => Self::Stop,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Kind-specific view of a raw trace: the warehouse trace model always
    /// carries these eight fields, with nulls where the kind has no use for
    /// them. Call-family kinds collapse to `type: "call"` and keep the raw
    /// kind in `call_type`; creations report the deployed contract under
    /// `address` and the init payload under `code`; self-destructs point
    /// `address`/`to` at the destructed contract and `refund_address` at
    /// the beneficiary.
    pub fn overlay(&self, raw: &RawTraceRecord) -> TraceOverlay {
        match self {
            Self::Call | Self::DelegateCall | Self::StaticCall | Self::CallCode => TraceOverlay {
                r#type: "call".to_string(),
                call_type: Some(
                    match self {
                        Self::Call => "call",
                        Self::DelegateCall => "delegatecall",
                        Self::StaticCall => "staticcall",
                        Self::CallCode => "callcode",
                        _ => unreachable!(),
                    }
                    .to_string(),
                ),
                to: raw.action_to,
                input: raw.action_input.clone(),
                output: raw.result_output.clone(),
                ..Default::default()
            },
            Self::Create | Self::Create2 => TraceOverlay {
                r#type: "create".to_string(),
                address: raw.action_to,
                code: raw.action_input.clone(),
                ..Default::default()
            },
            Self::SelfDestruct => TraceOverlay {
                r#type: "suicide".to_string(),
                address: raw.action_from,
                to: raw.action_from,
                code: raw.action_input.clone(),
                refund_address: raw.action_to,
                ..Default::default()
            },
            Self::Invalid => TraceOverlay {
                r#type: "invalid".to_string(),
                address: raw.action_to,
                code: raw.action_input.clone(),
                ..Default::default()
            },
            Self::Stop => TraceOverlay {
                r#type: "stop".to_string(),
                ..Default::default()
            },
            Self::Unknown(tag) => TraceOverlay {
                r#type: tag.to_lowercase(),
                ..Default::default()
            },
        }
    }
}

/// The eight kind-dependent fields of the warehouse trace model. Overlaid
/// onto the renamed raw record; the overlay wins on conflicting names.
#[derive(Debug, Clone, Default)]
pub struct TraceOverlay {
    pub r#type: String,
    pub call_type: Option<String>,
    pub address: Option<Address>,
    pub to: Option<Address>,
    pub input: Option<Bytes>,
    pub code: Option<Bytes>,
    pub output: Option<Bytes>,
    pub refund_address: Option<Address>,
}

/////////////////////////////////// Transformed Data ///////////////////////////////////
// Final output format. Downstream consumers rely on a stable field set per
// table, so unused fields serialize as explicit nulls and are never skipped.
#[derive(Debug, Clone, Serialize)]
pub struct TransformedTraceRecord {
    pub block_number: u64,
    pub block_hash: Option<FixedBytes<32>>,
    pub block_date: Option<NaiveDate>,
    #[serde(serialize_with = "utc_time::serialize_opt")]
    pub block_time: Option<NaiveDateTime>,
    pub tx_hash: Option<FixedBytes<32>>,
    pub tx_index: Option<u64>,
    pub tx_from: Option<Address>,
    pub tx_to: Option<Address>,
    pub r#type: String,
    pub call_type: Option<String>,
    pub address: Option<Address>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    #[serde(serialize_with = "u256_decimal::serialize")]
    pub value: Option<U256>,
    #[serde(serialize_with = "u256_decimal::serialize")]
    pub gas: Option<U256>,
    #[serde(serialize_with = "u256_decimal::serialize")]
    pub gas_used: Option<U256>,
    pub input: Option<Bytes>,
    pub code: Option<Bytes>,
    pub output: Option<Bytes>,
    pub refund_address: Option<Address>,
    pub sub_traces: Option<u64>,
    pub trace_address: Option<Vec<u64>>,
    pub error: Option<String>,
}
