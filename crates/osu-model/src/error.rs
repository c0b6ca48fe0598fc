use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileAccess,
    Format,
    Range,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {path}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data: {0}")]
    Format(String),

    #[error("value out of range: {0}")]
    Range(String),

    #[error("compressed block could not be processed")]
    Compression(#[source] std::io::Error),

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub fn range(message: impl Into<String>) -> Self {
        Error::Range(message.into())
    }

    /// Annotates the error with the 1-based line it was raised on.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::Line { .. } => self,
            other => Error::Line {
                line,
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileAccess { .. } => ErrorKind::FileAccess,
            Error::Format(_) | Error::Compression(_) => ErrorKind::Format,
            Error::Range(_) => ErrorKind::Range,
            Error::Line { source, .. } => source.kind(),
        }
    }
}
