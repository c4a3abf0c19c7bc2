//! Contract for the remote file-access service.
//!
//! The device side of a session is an external collaborator. It advertises a
//! subset of [`Primitive`]s; anything it does not advertise is assumed absent.
//! Raw listing and stat results come back as loosely shaped JSON values and are
//! normalized by [`normalize`] before the rest of the engine sees them.

pub mod capability;
pub mod mounted;
pub mod normalize;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncRead;

pub use capability::CapabilitySet;
pub use mounted::MountedService;
pub use normalize::{RemoteStat, normalize_entry, normalize_listing, normalize_stat};

/// A readable byte stream opened on the remote side.
pub type RemoteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Errors raised by the remote service.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The path does not exist on the device.
    #[error("not found: {0}")]
    NotFound(String),

    /// The device refused access to the path.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The service does not implement this primitive.
    #[error("primitive `{0}` is not available")]
    Unsupported(Primitive),

    /// Protocol-level failure reported by the service.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The group of interchangeable primitives a [`Primitive`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Directory enumeration.
    Enumerate,
    /// Chunked open-for-read.
    Stream,
    /// Whole-file read into memory.
    BulkRead,
    /// Remote-to-local copy performed by the service.
    CopyOut,
}

/// An individual operation a device service may or may not expose.
///
/// Names follow the service's own method vocabulary so that capability logs
/// match what the device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    ListDir,
    Ls,
    ListDirectory,
    Open,
    FileOpen,
    GetFileContents,
    PullFile,
    Pull,
}

impl Primitive {
    /// Every known primitive.
    pub const ALL: [Self; 8] = [
        Self::ListDir,
        Self::Ls,
        Self::ListDirectory,
        Self::Open,
        Self::FileOpen,
        Self::GetFileContents,
        Self::PullFile,
        Self::Pull,
    ];

    /// The service-side method name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ListDir => "listdir",
            Self::Ls => "ls",
            Self::ListDirectory => "list_directory",
            Self::Open => "open",
            Self::FileOpen => "file_open",
            Self::GetFileContents => "get_file_contents",
            Self::PullFile => "pull_file",
            Self::Pull => "pull",
        }
    }

    /// Which family of interchangeable operations this belongs to.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::ListDir | Self::Ls | Self::ListDirectory => Family::Enumerate,
            Self::Open | Self::FileOpen => Family::Stream,
            Self::GetFileContents => Family::BulkRead,
            Self::PullFile | Self::Pull => Family::CopyOut,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ready, authenticated file-access session on the device.
///
/// Implementations only need to override the primitives they advertise; the
/// defaults report [`RemoteError::Unsupported`].
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Primitives exposed by this service. Queried once per session.
    fn advertised(&self) -> Vec<Primitive>;

    /// Checks whether a path exists.
    async fn exists(&self, path: &str) -> Result<bool, RemoteError>;

    /// Checks whether a path is a directory.
    async fn is_dir(&self, path: &str) -> Result<bool, RemoteError>;

    /// Returns the raw stat record for a path.
    async fn stat(&self, path: &str) -> Result<Value, RemoteError>;

    /// Lists a directory with the given enumeration primitive.
    ///
    /// `Ok(None)` means the primitive ran but produced nothing usable.
    async fn enumerate(&self, primitive: Primitive, _path: &str) -> Result<Option<Value>, RemoteError> {
        Err(RemoteError::Unsupported(primitive))
    }

    /// Opens a file for chunked reading.
    async fn open(&self, primitive: Primitive, _path: &str) -> Result<RemoteStream, RemoteError> {
        Err(RemoteError::Unsupported(primitive))
    }

    /// Reads an entire file into memory.
    async fn read_all(&self, primitive: Primitive, _path: &str) -> Result<Vec<u8>, RemoteError> {
        Err(RemoteError::Unsupported(primitive))
    }

    /// Copies a remote file to a local path.
    async fn copy_out(
        &self,
        primitive: Primitive,
        _path: &str,
        _local: &Path,
    ) -> Result<(), RemoteError> {
        Err(RemoteError::Unsupported(primitive))
    }
}

/// Joins a remote directory path and an entry name.
#[must_use]
pub fn join_remote(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Returns the final component of a remote path.
#[must_use]
pub fn remote_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
