use std::path::PathBuf;

use strum_macros::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse config '{path}': {source}")]
    Config {
        path: PathBuf,
        source: serde_yml::Error,
    },

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode or encode image '{path}': {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Unsupported image format for '{path}': {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        source: std::io::Error,
    },

    #[error("Worker {worker} terminated abnormally")]
    WorkerFailure { worker: usize },
}

/// Coarse classification reported by the command line front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfiguration,
    IoFailure,
    WorkerFailure,
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfiguration(_) | Error::Config { .. } => ErrorKind::InvalidConfiguration,
            Error::Io { .. } | Error::Image { .. } | Error::UnsupportedFormat { .. } => {
                ErrorKind::IoFailure
            }
            Error::Spawn { .. } | Error::WorkerFailure { .. } => ErrorKind::WorkerFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
