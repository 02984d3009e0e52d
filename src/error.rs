//! Crate-level error type.

use thiserror::Error;

/// Top-level error for stellar-nav tools.
#[derive(Error, Debug)]
pub enum StellarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("world grid error: {0}")]
    World(String),

    #[error("map file error: {0}")]
    MapFile(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for StellarError {
    fn from(e: toml::de::Error) -> Self {
        StellarError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StellarError>;
