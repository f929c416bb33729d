use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("trace in block {block_number} carries no operation kind tag")]
    MissingKindTag { block_number: u64 },
    #[error("cannot coerce {field} '{value}' in block {block_number} to an integer")]
    QuantityCoercion {
        field: &'static str,
        value: String,
        block_number: u64,
    },
    #[error("malformed trace address '{value}' in block {block_number}")]
    MalformedTraceAddress { value: String, block_number: u64 },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("warehouse API key is not configured (set DUNE_API_KEY)")]
    MissingApiKey,
    #[error("warehouse rejected insert into '{table}' with status {status}: {body}")]
    InsertRejected {
        table: String,
        status: u16,
        body: String,
    },
}
