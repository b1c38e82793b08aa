//! Error types for helio-roll

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollError {
    #[error("Invalid view state: {0}")]
    ViewState(#[from] serde_json::Error),
    #[error("Row height out of range: {0}")]
    InvalidRowHeight(i32),
}

pub type Result<T> = std::result::Result<T, RollError>;
