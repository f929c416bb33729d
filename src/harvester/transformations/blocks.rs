use anyhow::Result;

use super::utc_date_time;
use crate::models::datasets::blocks::{RawBlockRecord, TransformedBlockRecord};

pub trait BlockTransformer {
    fn transform_blocks(blocks: Vec<RawBlockRecord>) -> Result<Vec<TransformedBlockRecord>>;
}

impl BlockTransformer for RawBlockRecord {
    fn transform_blocks(blocks: Vec<RawBlockRecord>) -> Result<Vec<TransformedBlockRecord>> {
        blocks
            .into_iter()
            .map(|block| {
                let (date, time) = utc_date_time(block.timestamp)?;

                Ok(TransformedBlockRecord {
                    number: block.block_number,
                    hash: block.block_hash,
                    parent_hash: block.parent_hash,
                    miner: block.author,
                    gas_limit: block.gas_limit,
                    gas_used: block.gas_used,
                    extra_data: block.extra_data,
                    base_fee_per_gas: block.base_fee_per_gas,
                    logs_bloom: block.logs_bloom,
                    size: block.size,
                    nonce: block.nonce,
                    total_difficulty: block.total_difficulty_string,
                    date,
                    time,
                })
            })
            .collect::<Result<Vec<_>>>()
    }
}
