use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("Failed to serialize watch history: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
