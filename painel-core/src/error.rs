use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum PainelError {
    #[error("authentication error: you must be logged in")]
    Unauthenticated,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Other error: {0}")]
    Other(String),
}
