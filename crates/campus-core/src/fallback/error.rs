use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("Corrupt snapshot under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage full: writing {key} needs {needed} bytes, {available} available")]
    Full {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}
