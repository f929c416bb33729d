use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use chrono::NaiveDate;
use serde_json::json;

use blockchain_harvester::harvester::context::TxContextIndex;
use blockchain_harvester::harvester::ndjson::to_ndjson;
use blockchain_harvester::harvester::transform_batch;
use blockchain_harvester::harvester::transformations::blocks::BlockTransformer;
use blockchain_harvester::harvester::transformations::logs::LogTransformer;
use blockchain_harvester::harvester::transformations::traces::{
    TraceTransformer, coerce_quantity, decode_trace_address,
};
use blockchain_harvester::harvester::transformations::transactions::TransactionTransformer;
use blockchain_harvester::models::common::{RawBatch, RawQuantity};
use blockchain_harvester::models::datasets::blocks::RawBlockRecord;
use blockchain_harvester::models::datasets::logs::RawLogRecord;
use blockchain_harvester::models::datasets::traces::{RawTraceRecord, TransformedTraceRecord};
use blockchain_harvester::models::datasets::transactions::RawTransactionRecord;

// 2015-07-30 15:26:28 UTC
const TIMESTAMP: u64 = 1438269988;
const BLOCK_DATE: &str = "2015-07-30";
const BLOCK_TIME: &str = "2015-07-30 15:26:28";

fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

fn hash(byte: u8) -> FixedBytes<32> {
    FixedBytes::repeat_byte(byte)
}

fn payload(data: &[u8]) -> Bytes {
    Bytes::copy_from_slice(data)
}

fn quantity(value: serde_json::Value) -> Option<RawQuantity> {
    Some(RawQuantity(value))
}

fn raw_transaction(block_number: u64, hash_byte: u8, from_byte: u8, to_byte: u8) -> RawTransactionRecord {
    RawTransactionRecord {
        block_number,
        transaction_index: Some(0),
        transaction_hash: hash(hash_byte),
        timestamp: TIMESTAMP,
        nonce: Some(7),
        from_address: Some(addr(from_byte)),
        to_address: Some(addr(to_byte)),
        value_string: Some("1000000000000000000".to_string()),
        value_binary: None,
        value_f64: Some(1e18),
        input: Some(payload(&[0xab, 0xcd])),
        gas_limit: Some(21_000),
        gas_used: Some(21_000),
        gas_price: Some(50_000_000_000),
        transaction_type: Some(2),
        max_fee_per_gas: Some(60_000_000_000),
        max_priority_fee_per_gas: Some(1_000_000_000),
        success: Some(true),
        n_input_bytes: Some(2),
        n_input_zero_bytes: Some(0),
        n_input_nonzero_bytes: Some(2),
        chain_id: Some(11155111),
    }
}

fn raw_block(block_number: u64) -> RawBlockRecord {
    RawBlockRecord {
        block_number,
        block_hash: Some(hash(0x10)),
        parent_hash: Some(hash(0x0f)),
        timestamp: TIMESTAMP,
        author: Some(addr(0x99)),
        gas_limit: Some(30_000_000),
        gas_used: Some(21_000),
        extra_data: Some(payload(&[0x00])),
        base_fee_per_gas: Some(7),
        logs_bloom: None,
        size: Some(1024),
        nonce: Some("0x0000000000000000".to_string()),
        total_difficulty_string: Some("17179869184".to_string()),
        total_difficulty_binary: None,
        total_difficulty_f64: Some(17179869184.0),
        chain_id: Some(11155111),
    }
}

fn raw_log(block_number: u64, tx_hash_byte: u8) -> RawLogRecord {
    RawLogRecord {
        block_number,
        block_hash: Some(hash(0x10)),
        transaction_index: Some(0),
        transaction_hash: hash(tx_hash_byte),
        log_index: Some(3),
        address: Some(addr(0x77)),
        topic0: Some(hash(0xa0)),
        topic1: Some(hash(0xa1)),
        topic2: None,
        topic3: None,
        data: Some(payload(&[0xde, 0xad])),
        n_data_bytes: Some(2),
        chain_id: Some(11155111),
    }
}

fn raw_trace(kind: &str) -> RawTraceRecord {
    RawTraceRecord {
        block_number: 100,
        block_hash: Some(hash(0x10)),
        transaction_hash: Some(hash(0x11)),
        transaction_index: Some(0),
        action_type: Some(kind.to_string()),
        action_call_type: Some(kind.to_lowercase()),
        action_from: Some(addr(0x0e)),
        action_to: Some(addr(0x22)),
        action_value: quantity(json!("1000000000000000000")),
        action_gas: quantity(json!("21000")),
        action_input: Some(payload(&[0x01, 0x02])),
        action_init: None,
        action_reward_type: None,
        result_gas_used: quantity(json!("20000")),
        result_output: Some(payload(&[0x03])),
        result_code: None,
        result_address: None,
        subtraces: Some(0),
        trace_address: Some(String::new()),
        error: None,
        chain_id: Some(11155111),
    }
}

fn transform_single(trace: RawTraceRecord, context: &TxContextIndex) -> TransformedTraceRecord {
    let mut records =
        <RawTraceRecord as TraceTransformer>::transform_traces(vec![trace], context, None)
            .expect("trace transformation failed");
    assert_eq!(records.len(), 1);
    records.remove(0)
}

fn all_datasets() -> Vec<String> {
    ["blocks", "transactions", "logs", "traces"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

//////////////////////////////// TraceKindMapper ///////////////////////////////////////

#[test]
fn call_family_collapses_to_call_type() {
    let cases = [
        ("CALL", "call"),
        ("DELEGATECALL", "delegatecall"),
        ("STATICCALL", "staticcall"),
        ("CALLCODE", "callcode"),
        // Kind matching is case-insensitive
        ("delegatecall", "delegatecall"),
        ("StaticCall", "staticcall"),
    ];

    for (kind, expected_call_type) in cases {
        let record = transform_single(raw_trace(kind), &TxContextIndex::default());
        assert_eq!(record.r#type, "call", "kind {kind}");
        assert_eq!(record.call_type.as_deref(), Some(expected_call_type));
        assert_eq!(record.address, None);
        assert_eq!(record.to, Some(addr(0x22)));
        assert_eq!(record.input, Some(payload(&[0x01, 0x02])));
        assert_eq!(record.code, None);
        assert_eq!(record.output, Some(payload(&[0x03])));
        assert_eq!(record.refund_address, None);
    }
}

#[test]
fn create_kinds_report_deployment() {
    for kind in ["CREATE", "CREATE2"] {
        let record = transform_single(raw_trace(kind), &TxContextIndex::default());
        assert_eq!(record.r#type, "create", "kind {kind}");
        assert_eq!(record.call_type, None);
        assert_eq!(record.address, Some(addr(0x22)));
        assert_eq!(record.to, None);
        assert_eq!(record.input, None);
        assert_eq!(record.code, Some(payload(&[0x01, 0x02])));
        assert_eq!(record.output, None);
        assert_eq!(record.refund_address, None);
    }
}

#[test]
fn selfdestruct_maps_to_suicide() {
    let record = transform_single(raw_trace("SELFDESTRUCT"), &TxContextIndex::default());
    assert_eq!(record.r#type, "suicide");
    assert_eq!(record.call_type, None);
    assert_eq!(record.address, Some(addr(0x0e)));
    assert_eq!(record.to, Some(addr(0x0e)));
    assert_eq!(record.input, None);
    assert_eq!(record.code, Some(payload(&[0x01, 0x02])));
    assert_eq!(record.output, None);
    assert_eq!(record.refund_address, Some(addr(0x22)));
}

#[test]
fn invalid_keeps_target_and_payload() {
    let record = transform_single(raw_trace("INVALID"), &TxContextIndex::default());
    assert_eq!(record.r#type, "invalid");
    assert_eq!(record.call_type, None);
    assert_eq!(record.address, Some(addr(0x22)));
    assert_eq!(record.to, None);
    assert_eq!(record.input, None);
    assert_eq!(record.code, Some(payload(&[0x01, 0x02])));
    assert_eq!(record.output, None);
    assert_eq!(record.refund_address, None);
}

#[test]
fn stop_nulls_every_detail_field() {
    let record = transform_single(raw_trace("STOP"), &TxContextIndex::default());
    assert_eq!(record.r#type, "stop");
    assert_eq!(record.call_type, None);
    assert_eq!(record.address, None);
    assert_eq!(record.to, None);
    assert_eq!(record.input, None);
    assert_eq!(record.code, None);
    assert_eq!(record.output, None);
    assert_eq!(record.refund_address, None);
}

#[test]
fn unknown_kind_passes_through_lowercased() {
    let record = transform_single(raw_trace("FOO"), &TxContextIndex::default());
    assert_eq!(record.r#type, "foo");
    assert_eq!(record.call_type, None);
    assert_eq!(record.address, None);
    assert_eq!(record.to, None);
    assert_eq!(record.input, None);
    assert_eq!(record.code, None);
    assert_eq!(record.output, None);
    assert_eq!(record.refund_address, None);
    // Non-overlay fields still survive the rename
    assert_eq!(record.from, Some(addr(0x0e)));
}

#[test]
fn missing_kind_tag_fails_the_record() {
    let mut trace = raw_trace("CALL");
    trace.action_type = None;
    let result = <RawTraceRecord as TraceTransformer>::transform_traces(
        vec![trace],
        &TxContextIndex::default(),
        None,
    );
    assert!(result.is_err());
}

//////////////////////////////// TraceNormalizer ///////////////////////////////////////

#[test]
fn trace_address_decodes_to_index_path() {
    let mut trace = raw_trace("CALL");
    trace.trace_address = Some("0_2_1".to_string());
    let record = transform_single(trace, &TxContextIndex::default());
    assert_eq!(record.trace_address, Some(vec![0, 2, 1]));

    // Empty and absent paths are the root trace, never an empty sequence
    let mut trace = raw_trace("CALL");
    trace.trace_address = Some(String::new());
    let record = transform_single(trace, &TxContextIndex::default());
    assert_eq!(record.trace_address, None);

    let mut trace = raw_trace("CALL");
    trace.trace_address = None;
    let record = transform_single(trace, &TxContextIndex::default());
    assert_eq!(record.trace_address, None);
}

#[test]
fn malformed_trace_address_fails() {
    assert!(decode_trace_address(Some("0_x_1"), 100).is_err());
    assert_eq!(decode_trace_address(Some("4"), 100).unwrap(), Some(vec![4]));
}

#[test]
fn quantity_coercion_collapses_falsy_values() {
    for falsy in [json!(""), json!("0"), json!("0.0"), json!(0), json!(null)] {
        let raw = RawQuantity(falsy.clone());
        assert_eq!(
            coerce_quantity(Some(&raw), "value", 100).unwrap(),
            None,
            "input {falsy}"
        );
    }
    assert_eq!(coerce_quantity(None, "value", 100).unwrap(), None);
}

#[test]
fn quantity_coercion_is_256_bit_safe() {
    let raw = RawQuantity(json!("123456789012345678901234"));
    let expected = U256::from_str_radix("123456789012345678901234", 10).unwrap();
    assert_eq!(coerce_quantity(Some(&raw), "value", 100).unwrap(), Some(expected));

    // Float-rendered integers parse; true fractions do not
    let raw = RawQuantity(json!("21000.0"));
    assert_eq!(
        coerce_quantity(Some(&raw), "gas", 100).unwrap(),
        Some(U256::from(21_000u64))
    );
    assert!(coerce_quantity(Some(&RawQuantity(json!("12.5"))), "gas", 100).is_err());
    assert!(coerce_quantity(Some(&RawQuantity(json!("abc"))), "gas", 100).is_err());
}

#[test]
fn block_context_join_is_first_transaction_wins() {
    let transactions = vec![
        raw_transaction(100, 0x01, 0xaa, 0xbb),
        raw_transaction(100, 0x02, 0xcc, 0xdd),
    ];
    let context = TxContextIndex::build(&transactions);

    let record = transform_single(raw_trace("CALL"), &context);
    assert_eq!(record.tx_from, Some(addr(0xaa)));
    assert_eq!(record.tx_to, Some(addr(0xbb)));
    assert_eq!(record.block_date, NaiveDate::from_ymd_opt(2015, 7, 30));
}

#[test]
fn unjoinable_context_degrades_to_nulls() {
    let context = TxContextIndex::build(&[raw_transaction(42, 0x01, 0xaa, 0xbb)]);

    // Trace in block 100, context only covers block 42
    let record = transform_single(raw_trace("CALL"), &context);
    assert_eq!(record.tx_from, None);
    assert_eq!(record.tx_to, None);
    assert_eq!(record.block_date, None);
    assert_eq!(record.block_time, None);
}

#[test]
fn trace_order_is_preserved() {
    let traces = vec![raw_trace("CALL"), raw_trace("CREATE"), raw_trace("STOP")];
    let records = <RawTraceRecord as TraceTransformer>::transform_traces(
        traces,
        &TxContextIndex::default(),
        None,
    )
    .unwrap();
    let kinds: Vec<&str> = records.iter().map(|r| r.r#type.as_str()).collect();
    assert_eq!(kinds, vec!["call", "create", "stop"]);
}

/////////////////////////////// Sibling transformers ///////////////////////////////////

#[test]
fn blocks_rename_and_derive_dates() {
    let records =
        <RawBlockRecord as BlockTransformer>::transform_blocks(vec![raw_block(46147)]).unwrap();
    let record = &records[0];
    assert_eq!(record.number, 46147);
    assert_eq!(record.miner, Some(addr(0x99)));
    assert_eq!(record.total_difficulty.as_deref(), Some("17179869184"));
    assert_eq!(record.date, NaiveDate::from_ymd_opt(2015, 7, 30).unwrap());

    let line = to_ndjson(&records).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.lines().next().unwrap()).unwrap();
    assert_eq!(value["time"], json!(BLOCK_TIME));
    assert_eq!(value["date"], json!(BLOCK_DATE));
    // Dropped columns do not leak into the output
    assert!(value.get("timestamp").is_none());
    assert!(value.get("chain_id").is_none());
    assert!(value.get("total_difficulty_f64").is_none());
}

#[test]
fn transactions_rename_and_keep_chain_id() {
    let records = <RawTransactionRecord as TransactionTransformer>::transform_transactions(vec![
        raw_transaction(100, 0x01, 0xaa, 0xbb),
    ])
    .unwrap();
    let record = &records[0];
    assert_eq!(record.hash, hash(0x01));
    assert_eq!(record.from, Some(addr(0xaa)));
    assert_eq!(record.to, Some(addr(0xbb)));
    assert_eq!(record.value.as_deref(), Some("1000000000000000000"));
    assert_eq!(record.data, Some(payload(&[0xab, 0xcd])));
    assert_eq!(record.r#type, Some(2));

    let line = to_ndjson(&records).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.lines().next().unwrap()).unwrap();
    assert_eq!(value["block_date"], json!(BLOCK_DATE));
    assert_eq!(value["block_time"], json!(BLOCK_TIME));
    assert_eq!(value["chain_id"], json!(11155111));
    assert!(value.get("value_f64").is_none());
    assert!(value.get("n_input_bytes").is_none());
    assert!(value.get("timestamp").is_none());
}

#[test]
fn logs_join_addresses_by_transaction_hash() {
    let context = TxContextIndex::build(&[raw_transaction(100, 0x01, 0xaa, 0xbb)]);
    let records =
        <RawLogRecord as LogTransformer>::transform_logs(vec![raw_log(100, 0x01)], &context, None)
            .unwrap();
    let record = &records[0];
    assert_eq!(record.contract_address, Some(addr(0x77)));
    assert_eq!(record.index, Some(3));
    assert_eq!(record.tx_from, Some(addr(0xaa)));
    assert_eq!(record.tx_to, Some(addr(0xbb)));
    assert_eq!(record.block_date, NaiveDate::from_ymd_opt(2015, 7, 30));

    // A hash the batch has never seen joins to nulls
    let records =
        <RawLogRecord as LogTransformer>::transform_logs(vec![raw_log(100, 0x0f)], &context, None)
            .unwrap();
    assert_eq!(records[0].tx_from, None);
    assert_eq!(records[0].tx_to, None);
}

//////////////////////////////////// RecordEmitter /////////////////////////////////////

#[test]
fn ndjson_is_one_object_per_line() {
    let context = TxContextIndex::default();
    let records = <RawTraceRecord as TraceTransformer>::transform_traces(
        vec![raw_trace("CALL"), raw_trace("STOP")],
        &context,
        None,
    )
    .unwrap();

    let output = to_ndjson(&records).unwrap();
    assert!(output.ends_with('\n'));
    assert!(!output.trim_start().starts_with('['));

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        let object = value.as_object().unwrap();
        // Stable field set: unused fields are explicit nulls, never omitted
        for field in [
            "type",
            "call_type",
            "address",
            "to",
            "input",
            "code",
            "output",
            "refund_address",
            "trace_address",
            "value",
            "gas",
            "gas_used",
        ] {
            assert!(object.contains_key(field), "missing field {field}");
        }
    }
    assert!(!output.contains("NaN"));
}

#[test]
fn large_values_emit_as_exact_integer_tokens() {
    let mut trace = raw_trace("CALL");
    trace.action_value = quantity(json!("123456789012345678901234"));
    let records = <RawTraceRecord as TraceTransformer>::transform_traces(
        vec![trace],
        &TxContextIndex::default(),
        None,
    )
    .unwrap();

    let output = to_ndjson(&records).unwrap();
    assert!(
        output.contains("\"value\":123456789012345678901234"),
        "value was not an exact integer token: {output}"
    );
}

//////////////////////////////////// End to end ////////////////////////////////////////

#[test]
fn one_block_one_transaction_one_root_call_trace() {
    let raw = RawBatch {
        blocks: vec![raw_block(100)],
        transactions: vec![raw_transaction(100, 0x11, 0xaa, 0xbb)],
        logs: vec![raw_log(100, 0x11)],
        traces: vec![raw_trace("CALL")],
    };

    let batch = transform_batch(raw, &all_datasets(), None).unwrap();
    assert_eq!(batch.blocks.len(), 1);
    assert_eq!(batch.transactions.len(), 1);
    assert_eq!(batch.logs.len(), 1);
    assert_eq!(batch.traces.len(), 1);

    let output = to_ndjson(&batch.traces).unwrap();
    let value: serde_json::Value = serde_json::from_str(output.lines().next().unwrap()).unwrap();

    assert_eq!(value["type"], json!("call"));
    assert_eq!(value["call_type"], json!("call"));
    assert_eq!(value["value"].as_u64(), Some(1_000_000_000_000_000_000));
    assert!(value["trace_address"].is_null());
    assert!(value.as_object().unwrap().contains_key("trace_address"));
    assert_eq!(value["block_date"], json!(BLOCK_DATE));
    assert_eq!(value["block_time"], json!(BLOCK_TIME));
    assert_eq!(value["tx_from"], json!(format!("0x{}", "aa".repeat(20))));
    assert_eq!(value["tx_to"], json!(format!("0x{}", "bb".repeat(20))));
}
