//! Error types for the afc-dl library.

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that can occur during scan and transfer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error reported by the remote file-access service.
    #[error("remote service error: {0}")]
    Remote(#[from] RemoteError),

    /// I/O error during local file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The device advertises no primitive for the requested capability.
    #[error("device does not support {0}")]
    Unsupported(&'static str),

    /// The service came up but the filesystem could not be listed.
    #[error("remote filesystem is not accessible")]
    ServiceUnavailable,

    /// Operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// A specialized `Result` type for afc-dl operations.
pub type Result<T> = std::result::Result<T, Error>;
