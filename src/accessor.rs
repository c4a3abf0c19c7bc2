//! Capability-probing access to the remote filesystem.
//!
//! Wraps a [`RemoteService`] and dispatches every call through the primitives
//! recorded in its [`CapabilitySet`]. Inaccessible paths degrade to "absent"
//! rather than errors, since the device routinely refuses parts of its tree.

use std::path::Path;

use crate::cancel::StopToken;
use crate::error::{Error, Result};
use crate::remote::{
    CapabilitySet, Family, RemoteError, RemoteService, RemoteStat, RemoteStream, normalize_listing,
    normalize_stat,
};

/// Directory accessor over a remote service.
pub struct DirectoryAccessor<S: RemoteService> {
    service: S,
    capabilities: CapabilitySet,
    stop: StopToken,
}

impl<S: RemoteService> DirectoryAccessor<S> {
    /// Probes the service's primitives and wraps it.
    pub fn new(service: S, stop: StopToken) -> Self {
        let capabilities = CapabilitySet::probe(&service);
        Self {
            service,
            capabilities,
            stop,
        }
    }

    /// Returns the underlying service.
    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Returns the capabilities probed at construction.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Returns the stop token shared with this accessor.
    #[must_use]
    pub const fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    /// Returns true if `path` exists. Failures count as absent.
    pub async fn exists(&self, path: &str) -> bool {
        match self.service.exists(path).await {
            Ok(exists) => exists,
            Err(e) => {
                log::debug!("exists({path}) failed: {e}");
                false
            }
        }
    }

    /// Checks whether `path` is a directory, surfacing the failure.
    ///
    /// # Errors
    ///
    /// Returns the service error unchanged.
    pub async fn try_is_directory(&self, path: &str) -> std::result::Result<bool, RemoteError> {
        self.service.is_dir(path).await
    }

    /// Returns true if `path` is a directory. Failures count as "not a directory".
    pub async fn is_directory(&self, path: &str) -> bool {
        self.try_is_directory(path).await.unwrap_or_else(|e| {
            log::debug!("is_dir({path}) failed: {e}");
            false
        })
    }

    /// Lists the entry names of a directory.
    ///
    /// Tries each available enumeration primitive in priority order and
    /// returns the first usable result. Returns `None` if the path is missing,
    /// not a directory, the operation was stopped, or every primitive failed.
    pub async fn list(&self, path: &str) -> Option<Vec<String>> {
        if self.stop.is_stopped() {
            return None;
        }
        if !self.exists(path).await {
            log::debug!("Directory does not exist: {path}");
            return None;
        }
        if !self.is_directory(path).await {
            log::debug!("Not a directory: {path}");
            return None;
        }

        for primitive in self.capabilities.ordered(Family::Enumerate) {
            match self.service.enumerate(primitive, path).await {
                Ok(Some(raw)) => {
                    if let Some(names) = normalize_listing(&raw) {
                        return Some(names);
                    }
                    log::debug!("{primitive} returned an unrecognized shape for {path}");
                }
                Ok(None) => log::debug!("{primitive} returned nothing for {path}"),
                Err(e) => log::debug!("{primitive} failed on {path}: {e}"),
            }
        }

        log::debug!("All listing primitives failed: {path}");
        None
    }

    /// Returns normalized metadata for `path`, or `None` if unavailable.
    pub async fn stat(&self, path: &str) -> Option<RemoteStat> {
        match self.service.stat(path).await {
            Ok(raw) => {
                let stat = normalize_stat(&raw);
                if stat.is_none() {
                    log::debug!("stat({path}) returned an unrecognized shape");
                }
                stat
            }
            Err(e) => {
                log::debug!("stat({path}) failed: {e}");
                None
            }
        }
    }

    /// Opens `path` for chunked reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] if no chunked-open primitive exists, or
    /// the last primitive's error if all of them failed.
    pub async fn open_for_read(&self, path: &str) -> Result<RemoteStream> {
        let mut last = None;
        for primitive in self.capabilities.ordered(Family::Stream) {
            match self.service.open(primitive, path).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    log::debug!("{primitive} failed on {path}: {e}");
                    last = Some(e);
                }
            }
        }
        Err(last.map_or(Error::Unsupported("chunked read"), Error::Remote))
    }

    /// Reads all of `path` into memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] if no bulk-read primitive exists, or the
    /// last primitive's error if all of them failed.
    pub async fn read_all(&self, path: &str) -> Result<Vec<u8>> {
        let mut last = None;
        for primitive in self.capabilities.ordered(Family::BulkRead) {
            match self.service.read_all(primitive, path).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    log::debug!("{primitive} failed on {path}: {e}");
                    last = Some(e);
                }
            }
        }
        Err(last.map_or(Error::Unsupported("bulk read"), Error::Remote))
    }

    /// Has the service copy `path` straight to `local`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] if no copy-out primitive exists, or the
    /// last primitive's error if all of them failed.
    pub async fn copy_out(&self, path: &str, local: &Path) -> Result<()> {
        let mut last = None;
        for primitive in self.capabilities.ordered(Family::CopyOut) {
            match self.service.copy_out(primitive, path, local).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::debug!("{primitive} failed on {path}: {e}");
                    last = Some(e);
                }
            }
        }
        Err(last.map_or(Error::Unsupported("copy-out"), Error::Remote))
    }
}
