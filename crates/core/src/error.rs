use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("unknown patient record: {0}")]
    UnknownRecord(String),
    #[error("stale write rejected for '{key}': stored version {stored}, loaded version {loaded}")]
    StaleWrite {
        key: String,
        stored: u64,
        loaded: u64,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to serialise blob: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialise blob: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to read checklist catalogue: {0}")]
    CatalogRead(std::io::Error),
    #[error("failed to parse checklist catalogue: {0}")]
    CatalogParse(#[from] serde_yaml::Error),
}

pub type PostResult<T> = std::result::Result<T, PostError>;
