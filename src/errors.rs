//! Zyntalic error types.

use std::fmt;

#[derive(Debug, Clone)]
pub enum ZyntalicError {
    Config(String),
    Training(String),
    Io(String),
    InvalidInput(String),
}

impl fmt::Display for ZyntalicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "ConfigError: {msg}"),
            Self::Training(msg) => write!(f, "TrainingError: {msg}"),
            Self::Io(msg) => write!(f, "IoError: {msg}"),
            Self::InvalidInput(msg) => write!(f, "InvalidInput: {msg}"),
        }
    }
}

impl std::error::Error for ZyntalicError {}

pub type Result<T> = std::result::Result<T, ZyntalicError>;
