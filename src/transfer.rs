//! Multi-strategy single-file transfer.
//!
//! Every strategy writes to `<local>.part` and renames into place once the
//! data is complete, so `local` only ever holds a whole file. A failed or
//! cancelled attempt removes its `.part` file through the [`FileSystem`]; a
//! drop guard covers the transfer future being dropped mid-attempt.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::accessor::DirectoryAccessor;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::remote::{Family, RemoteService, RemoteStat, remote_basename};

/// A way of getting a file's bytes off the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Chunked read through an open remote handle.
    Stream,
    /// Whole-file read into memory, then one local write.
    BulkRead,
    /// Remote-to-local copy performed by the service.
    CopyOut,
}

impl Strategy {
    /// Order used unless configured otherwise.
    pub const DEFAULT_ORDER: [Self; 3] = [Self::Stream, Self::BulkRead, Self::CopyOut];

    /// The capability family this strategy needs.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Stream => Family::Stream,
            Self::BulkRead => Family::BulkRead,
            Self::CopyOut => Family::CopyOut,
        }
    }

    /// Configuration name of the strategy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::BulkRead => "bulk_read",
            Self::CopyOut => "copy_out",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why one strategy did not produce the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: Strategy,
    pub message: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.message)
    }
}

fn join_failures(failures: &[StrategyFailure]) -> String {
    if failures.is_empty() {
        return "no strategy configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a file was not transferred.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// A stop was requested while the file was in flight.
    #[error("cancelled")]
    Cancelled,

    /// Every configured strategy failed.
    #[error("all strategies failed ({})", join_failures(.0))]
    Exhausted(Vec<StrategyFailure>),

    /// The remote path would land outside the output root.
    #[error("refusing unsafe path: {0}")]
    UnsafePath(String),

    /// The local destination could not be prepared.
    #[error("local file system error: {0}")]
    Local(String),
}

/// Result of transferring one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The file was written to its local path.
    Success { bytes: u64, strategy: Strategy },
    /// A local copy of the expected size was already present.
    Skipped,
    /// No bytes were kept.
    Failed(FailReason),
}

impl TransferOutcome {
    /// Returns true for `Success` and `Skipped`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Skipped)
    }

    /// Returns true if the transfer was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Failed(FailReason::Cancelled))
    }
}

/// Returns the `.part` file path for a given final path.
fn part_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".part");
    PathBuf::from(os)
}

/// Returns true when a known remote size disagrees with what was written.
const fn size_mismatch(expected: u64, actual: u64) -> bool {
    expected > 0 && actual != expected
}

/// Removes a `.part` file when dropped, unless disarmed.
struct PartGuard<'p> {
    path: &'p Path,
    armed: bool,
}

impl<'p> PartGuard<'p> {
    const fn new(path: &'p Path) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(self.path) {
            Ok(()) => log::debug!("Removed partial file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {e}", self.path.display()),
        }
    }
}

/// Transfers single files from the device, falling back across strategies.
pub struct Transferrer<'a, S: RemoteService, F: FileSystem = TokioFileSystem> {
    accessor: &'a DirectoryAccessor<S>,
    config: &'a EngineConfig,
    fs: F,
}

impl<'a, S: RemoteService> Transferrer<'a, S, TokioFileSystem> {
    /// Creates a transferrer writing through `tokio::fs`.
    #[must_use]
    pub const fn new(accessor: &'a DirectoryAccessor<S>, config: &'a EngineConfig) -> Self {
        Self {
            accessor,
            config,
            fs: TokioFileSystem,
        }
    }
}

impl<'a, S: RemoteService, F: FileSystem> Transferrer<'a, S, F> {
    /// Creates a transferrer with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(accessor: &'a DirectoryAccessor<S>, config: &'a EngineConfig, fs: F) -> Self {
        Self {
            accessor,
            config,
            fs,
        }
    }

    /// Returns the accessor used for remote reads.
    #[must_use]
    pub const fn accessor(&self) -> &DirectoryAccessor<S> {
        self.accessor
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Copies `remote` to `local`.
    ///
    /// With `expected` metadata, a local file of the same non-zero size is
    /// skipped without touching the device, the written size is checked, and
    /// the local modification time is set. Strategies are attempted in the
    /// configured order; one is skipped when its capability is absent and the
    /// next is tried when it fails. Cancellation ends the transfer without
    /// trying further strategies.
    pub async fn transfer(
        &self,
        remote: &str,
        local: &Path,
        expected: Option<&RemoteStat>,
    ) -> TransferOutcome {
        if let Some(expected) = expected.filter(|e| e.size > 0) {
            if self.fs.file_size(local).await == Some(expected.size) {
                log::debug!("Already present: {}", local.display());
                return TransferOutcome::Skipped;
            }
        }

        let stop = self.accessor.stop_token();
        if stop.is_stopped() {
            return TransferOutcome::Failed(FailReason::Cancelled);
        }

        if let Err(e) = self.ensure_parent_dir(local).await {
            log::error!("Cannot create directory for {}: {e}", local.display());
            return TransferOutcome::Failed(FailReason::Local(e.to_string()));
        }

        let part = part_path(local);
        let mut failures = Vec::new();

        for &strategy in &self.config.strategy_order {
            if stop.is_stopped() {
                return TransferOutcome::Failed(FailReason::Cancelled);
            }
            if !self.accessor.capabilities().has(strategy.family()) {
                log::debug!("{strategy} unavailable for {remote}");
                failures.push(StrategyFailure {
                    strategy,
                    message: "not available on this device".to_string(),
                });
                continue;
            }

            let guard = PartGuard::new(&part);
            let attempt = match strategy {
                Strategy::Stream => self.stream_copy(remote, &part, expected).await,
                Strategy::BulkRead => self.bulk_read(remote, &part).await,
                Strategy::CopyOut => self.copy_out(remote, &part).await,
            };

            match attempt {
                Ok(()) => {
                    if let Err(e) = self.fs.rename_file(&part, local).await {
                        log::debug!("{strategy} could not finalize {}: {e}", local.display());
                        if self.discard_part(&part).await {
                            guard.disarm();
                        }
                        failures.push(StrategyFailure {
                            strategy,
                            message: format!("rename failed: {e}"),
                        });
                        continue;
                    }
                    guard.disarm();
                    let bytes = self.finish(remote, local, expected).await;
                    log::info!("Downloaded {remote} via {strategy}");
                    return TransferOutcome::Success { bytes, strategy };
                }
                Err(Error::Cancelled) => {
                    log::info!("Transfer of {remote} cancelled");
                    if self.discard_part(&part).await {
                        guard.disarm();
                    }
                    return TransferOutcome::Failed(FailReason::Cancelled);
                }
                Err(e) => {
                    log::debug!("{strategy} failed for {remote}: {e}");
                    if self.discard_part(&part).await {
                        guard.disarm();
                    }
                    failures.push(StrategyFailure {
                        strategy,
                        message: e.to_string(),
                    });
                }
            }
        }

        let reason = FailReason::Exhausted(failures);
        log::error!("Failed to download {remote}: {reason}");
        TransferOutcome::Failed(reason)
    }

    /// Removes a leftover `.part` file. Returns false if it may still exist.
    async fn discard_part(&self, part: &Path) -> bool {
        match self.fs.remove_file(part).await {
            Ok(()) => {
                log::debug!("Removed partial file {}", part.display());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                log::warn!("Could not remove {}: {e}", part.display());
                false
            }
        }
    }

    /// Ensures the parent directory exists for a file path.
    async fn ensure_parent_dir(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn stream_copy(
        &self,
        remote: &str,
        part: &Path,
        expected: Option<&RemoteStat>,
    ) -> Result<()> {
        let stop = self.accessor.stop_token();
        let mut reader = self.accessor.open_for_read(remote).await?;
        let mut file = self.fs.create_file(part).await?;

        let total = expected.map_or(0, |e| e.size);
        let report = total > self.config.chunk_progress_threshold;
        let name = remote_basename(remote);
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        let mut written = 0u64;

        loop {
            if stop.is_stopped() {
                return Err(Error::Cancelled);
            }
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
            written += n as u64;
            if report {
                stop.report_progress(written, total, format!("Downloading {name}"));
            }
        }
        file.flush().await?;
        Ok(())
    }

    async fn bulk_read(&self, remote: &str, part: &Path) -> Result<()> {
        let data = self.accessor.read_all(remote).await?;
        if self.accessor.stop_token().is_stopped() {
            return Err(Error::Cancelled);
        }
        self.fs.write_file(part, &data).await?;
        Ok(())
    }

    async fn copy_out(&self, remote: &str, part: &Path) -> Result<()> {
        self.accessor.copy_out(remote, part).await?;
        if self.accessor.stop_token().is_stopped() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Verifies the written size and applies the remote modification time.
    async fn finish(&self, remote: &str, local: &Path, expected: Option<&RemoteStat>) -> u64 {
        let actual = self.fs.file_size(local).await.unwrap_or(0);
        let Some(expected) = expected else {
            return actual;
        };
        if size_mismatch(expected.size, actual) {
            log::warn!(
                "Size mismatch for {remote}: expected {} bytes, wrote {actual}",
                expected.size
            );
        }
        if let Some(modified) = expected.modified {
            if let Err(e) = self.fs.set_modified(local, modified.into()).await {
                log::debug!("Could not set mtime on {}: {e}", local.display());
            }
        }
        actual
    }
}
