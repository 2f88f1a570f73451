use thiserror::Error;

use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid JSON record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode filtered record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("malformed key list: {0}")]
    KeyList(#[from] ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure is confined to a single record (bad JSON) rather
    /// than the stream itself
    pub fn is_record_error(&self) -> bool {
        match self {
            Error::Decode(_) | Error::Encode(_) => true,
            Error::Record { source, .. } => source.is_record_error(),
            Error::KeyList(_) | Error::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
