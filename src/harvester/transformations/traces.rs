use alloy_primitives::U256;
use anyhow::Result;
use opentelemetry::KeyValue;
use tracing::warn;

use super::utc_date_time;
use crate::harvester::context::TxContextIndex;
use crate::metrics::Metrics;
use crate::models::common::RawQuantity;
use crate::models::datasets::traces::{RawTraceRecord, TraceKind, TransformedTraceRecord};
use crate::models::errors::TraceError;

pub trait TraceTransformer {
    fn transform_traces(
        traces: Vec<RawTraceRecord>,
        context: &TxContextIndex,
        metrics: Option<&Metrics>,
    ) -> Result<Vec<TransformedTraceRecord>>;
}

impl TraceTransformer for RawTraceRecord {
    /// Normalize one range's raw traces into warehouse trace rows, order
    /// preserving. Per record: join block-level transaction context, derive
    /// the UTC date/time columns, rename raw columns, overlay the
    /// kind-specific fields (the overlay wins on conflicts), decode the
    /// trace-address path, and coerce the numeric columns to 256-bit-safe
    /// integers.
    fn transform_traces(
        traces: Vec<RawTraceRecord>,
        context: &TxContextIndex,
        metrics: Option<&Metrics>,
    ) -> Result<Vec<TransformedTraceRecord>> {
        let mut missing_context: u64 = 0;
        let mut unknown_kinds: u64 = 0;

        let records = traces
            .into_iter()
            .map(|trace| {
                let block_context = context.block_context(trace.block_number);
                if block_context.is_none() {
                    missing_context += 1;
                }

                let (block_date, block_time) = match block_context {
                    Some(ctx) => {
                        let (date, time) = utc_date_time(ctx.timestamp)?;
                        (Some(date), Some(time))
                    }
                    None => (None, None),
                };

                // A row without a kind tag would emit `type: null` and break
                // the stable-schema contract, so it fails the batch outright.
                let kind = match trace.action_type.as_deref() {
                    Some(tag) => TraceKind::parse(tag),
                    None => {
                        return Err(TraceError::MissingKindTag {
                            block_number: trace.block_number,
                        }
                        .into());
                    }
                };
                if let TraceKind::Unknown(tag) = &kind {
                    unknown_kinds += 1;
                    warn!(
                        "Unrecognized trace kind '{}' in block {}; passing through with null detail fields",
                        tag, trace.block_number
                    );
                }
                let overlay = kind.overlay(&trace);

                let value = coerce_quantity(trace.action_value.as_ref(), "value", trace.block_number)?;
                let gas = coerce_quantity(trace.action_gas.as_ref(), "gas", trace.block_number)?;
                let gas_used =
                    coerce_quantity(trace.result_gas_used.as_ref(), "gas_used", trace.block_number)?;
                let trace_address =
                    decode_trace_address(trace.trace_address.as_deref(), trace.block_number)?;

                Ok(TransformedTraceRecord {
                    block_number: trace.block_number,
                    block_hash: trace.block_hash,
                    block_date,
                    block_time,
                    tx_hash: trace.transaction_hash,
                    tx_index: trace.transaction_index,
                    tx_from: block_context.and_then(|ctx| ctx.from),
                    tx_to: block_context.and_then(|ctx| ctx.to),
                    r#type: overlay.r#type,
                    call_type: overlay.call_type,
                    address: overlay.address,
                    from: trace.action_from,
                    to: overlay.to,
                    value,
                    gas,
                    gas_used,
                    input: overlay.input,
                    code: overlay.code,
                    output: overlay.output,
                    refund_address: overlay.refund_address,
                    sub_traces: trace.subtraces,
                    trace_address,
                    error: trace.error,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if missing_context > 0 {
            warn!(
                "{} traces had no matching transaction context and were emitted with null joins",
                missing_context
            );
        }
        if let Some(metrics) = metrics {
            let chain = KeyValue::new("chain", metrics.chain_name.clone());
            if missing_context > 0 {
                metrics.missing_context.add(
                    missing_context,
                    &[chain.clone(), KeyValue::new("table", "traces")],
                );
            }
            if unknown_kinds > 0 {
                metrics.unknown_trace_kinds.add(unknown_kinds, &[chain]);
            }
        }

        Ok(records)
    }
}

/// Coerce a heterogeneous numeric column to an integer. Absent, empty, and
/// zero-like values (`"0"`, `"0.0"`, numeric `0`) collapse to null, matching
/// the warehouse schema's quirk for these columns. A present value that is
/// none of those and still fails to parse fails the record: it signals
/// upstream schema drift, not a null. Magnitudes can exceed 64 bits, so the
/// parse target is a 256-bit integer.
pub fn coerce_quantity(
    raw: Option<&RawQuantity>,
    field: &'static str,
    block_number: u64,
) -> Result<Option<U256>, TraceError> {
    let text = match raw.map(|quantity| &quantity.0) {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(text)) => text.trim().to_string(),
        Some(serde_json::Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
    };
    if text.is_empty() {
        return Ok(None);
    }

    // Zero values sometimes arrive float-rendered ("0.0"); a fractional part
    // of all zeros is discarded, anything else cannot be an integer.
    let integral = match text.split_once('.') {
        Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
        Some(_) => {
            return Err(TraceError::QuantityCoercion {
                field,
                value: text.clone(),
                block_number,
            });
        }
        None => text.as_str(),
    };

    let value =
        U256::from_str_radix(integral, 10).map_err(|_| TraceError::QuantityCoercion {
            field,
            value: text.clone(),
            block_number,
        })?;

    Ok((!value.is_zero()).then_some(value))
}

/// Decode an underscore-joined trace-address path into the ordered child
/// indices locating the trace in its call tree. Empty or absent input is
/// the root trace and maps to null, never an empty sequence.
pub fn decode_trace_address(
    raw: Option<&str>,
    block_number: u64,
) -> Result<Option<Vec<u64>>, TraceError> {
    let Some(path) = raw else {
        return Ok(None);
    };
    if path.is_empty() {
        return Ok(None);
    }

    path.split('_')
        .map(|index| {
            index
                .parse::<u64>()
                .map_err(|_| TraceError::MalformedTraceAddress {
                    value: path.to_string(),
                    block_number,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
