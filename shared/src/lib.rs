// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid cache key: key must not be empty")]
    InvalidKey,
    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
