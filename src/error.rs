use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SenderoError>;

/// Errors raised by roadmap, proximity, and codec operations.
#[derive(Debug, Error)]
pub enum SenderoError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Serialized roadmap text could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number where parsing stopped.
        line: usize,
        /// What was expected.
        message: String,
    },
    /// Internal bookkeeping disagrees with itself.
    #[error("corruption detected: {0}")]
    Corruption(&'static str),
    /// A referenced vertex, edge, point, or entry does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Caller supplied an argument outside the operation's contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A k-nearest query asked for more neighbors than the scratch width.
    #[error("query width {requested} exceeds the maximum of {max}")]
    QueryWidthExceeded {
        /// Requested neighbor count.
        requested: usize,
        /// Configured maximum query width.
        max: usize,
    },
    /// A nearest-point query was issued against an empty index.
    #[error("proximity index is empty")]
    EmptyIndex,
    /// An operation needed a point space but none is linked.
    #[error("no point space linked")]
    SpaceNotLinked,
    /// Options could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for SenderoError {
    fn from(err: toml::de::Error) -> Self {
        SenderoError::Config(err.to_string())
    }
}
