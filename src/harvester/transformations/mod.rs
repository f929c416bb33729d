pub mod blocks;
pub mod logs;
pub mod traces;
pub mod transactions;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

// Derive the warehouse date and time columns from a unix timestamp, both UTC.
pub(crate) fn utc_date_time(timestamp: u64) -> Result<(NaiveDate, NaiveDateTime)> {
    let datetime = DateTime::from_timestamp(timestamp as i64, 0)
        .with_context(|| format!("block timestamp {timestamp} is out of range"))?;
    Ok((datetime.date_naive(), datetime.naive_utc()))
}
