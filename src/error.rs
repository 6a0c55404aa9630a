use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("point count must not be negative (got {0})")]
    NegativePointCount(i64),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid color: {0}")]
    Color(String),
    #[error("host error: {0}")]
    Host(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type FieldResult<T> = Result<T, FieldError>;
