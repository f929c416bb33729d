use alloy_primitives::{Address, FixedBytes};
use std::collections::HashMap;

use crate::models::datasets::transactions::RawTransactionRecord;

/// Timestamp, sender, and recipient of the first transaction observed for a
/// block. Traces only reliably carry a block number, so block-level joins
/// resolve against this.
#[derive(Debug, Clone, Copy)]
pub struct BlockTxContext {
    pub timestamp: u64,
    pub from: Option<Address>,
    pub to: Option<Address>,
}

/// Context lookups built in one pass over a range's transaction batch.
/// Lookups are O(1); a miss means the block had no transactions (or the
/// hash is unknown to the batch) and joins degrade to nulls.
#[derive(Debug, Default)]
pub struct TxContextIndex {
    by_block: HashMap<u64, BlockTxContext>,
    by_hash: HashMap<FixedBytes<32>, (Option<Address>, Option<Address>)>,
}

impl TxContextIndex {
    pub fn build(transactions: &[RawTransactionRecord]) -> Self {
        let mut index = Self::default();
        for tx in transactions {
            // First transaction wins the block-level slot
            index.by_block.entry(tx.block_number).or_insert(BlockTxContext {
                timestamp: tx.timestamp,
                from: tx.from_address,
                to: tx.to_address,
            });
            index
                .by_hash
                .insert(tx.transaction_hash, (tx.from_address, tx.to_address));
        }
        index
    }

    pub fn block_context(&self, block_number: u64) -> Option<BlockTxContext> {
        self.by_block.get(&block_number).copied()
    }

    pub fn tx_addresses(
        &self,
        tx_hash: &FixedBytes<32>,
    ) -> Option<(Option<Address>, Option<Address>)> {
        self.by_hash.get(tx_hash).copied()
    }
}
