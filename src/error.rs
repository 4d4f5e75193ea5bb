//! Crate-level error type

use crate::generator::GenerateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
