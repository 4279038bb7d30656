// src/error.rs

use thiserror::Error;

/// Everything that can go wrong between asking for a topic and getting records back.
///
/// `Clone` so one failed load can be handed to every caller that was waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataLoadError {
    #[error("GET {url} returned {status} {reason}")]
    Http {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("GET {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("parsing {resource}: {message}")]
    Csv { resource: String, message: String },

    #[error("shaping {topic} records: {message}")]
    Shape { topic: String, message: String },

    #[error("unknown {kind} '{name}'. Available: {}", available.join(", "))]
    Unknown {
        kind: &'static str,
        name: String,
        available: Vec<String>,
    },
}

impl DataLoadError {
    /// HTTP status of a failed fetch, if the failure came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            DataLoadError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DataLoadError>;
