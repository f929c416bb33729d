use anyhow::Result;

use super::utc_date_time;
use crate::models::datasets::transactions::{RawTransactionRecord, TransformedTransactionRecord};

pub trait TransactionTransformer {
    fn transform_transactions(
        transactions: Vec<RawTransactionRecord>,
    ) -> Result<Vec<TransformedTransactionRecord>>;
}

impl TransactionTransformer for RawTransactionRecord {
    fn transform_transactions(
        transactions: Vec<RawTransactionRecord>,
    ) -> Result<Vec<TransformedTransactionRecord>> {
        transactions
            .into_iter()
            .map(|tx| {
                let (block_date, block_time) = utc_date_time(tx.timestamp)?;

                Ok(TransformedTransactionRecord {
                    block_number: tx.block_number,
                    block_date,
                    block_time,
                    index: tx.transaction_index,
                    hash: tx.transaction_hash,
                    nonce: tx.nonce,
                    from: tx.from_address,
                    to: tx.to_address,
                    value: tx.value_string,
                    data: tx.input,
                    gas_limit: tx.gas_limit,
                    gas_used: tx.gas_used,
                    gas_price: tx.gas_price,
                    r#type: tx.transaction_type,
                    max_fee_per_gas: tx.max_fee_per_gas,
                    max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
                    success: tx.success,
                    chain_id: tx.chain_id,
                })
            })
            .collect::<Result<Vec<_>>>()
    }
}
