//! Sequential batch download into a local mirror of the remote tree.

use std::path::{Component, Path, PathBuf};

use crate::analysis::FileRecord;
use crate::format::format_bytes;
use crate::fs::FileSystem;
use crate::remote::RemoteService;
use crate::stats::{BatchSummary, BatchSummaryBuilder};
use crate::transfer::{FailReason, TransferOutcome, Transferrer};

/// Maps a remote path to its place under `output_root`.
///
/// The leading `/` is stripped so the remote directory structure is kept.
/// Returns `None` for paths that are empty, contain a NUL byte, or would
/// escape `output_root` through `..` components.
#[must_use]
pub fn local_path_for(output_root: &Path, remote: &str) -> Option<PathBuf> {
    let relative = remote.trim_start_matches('/');
    if relative.is_empty() || relative.contains('\0') {
        return None;
    }

    let mut local = output_root.to_path_buf();
    let mut pushed = false;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                local.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    pushed.then_some(local)
}

/// Transfers `records` one at a time into `output_root`.
///
/// A stop request is honoured before each file; the summary then covers the
/// files handled so far. Failed files are not retried. A summary line is
/// logged every `summary_every` files and once at the end, cancelled or not.
pub async fn download_all<S: RemoteService, F: FileSystem>(
    transferrer: &Transferrer<'_, S, F>,
    records: &[FileRecord],
    output_root: &Path,
) -> BatchSummary {
    let stop = transferrer.accessor().stop_token();
    let summary_every = transferrer.config().summary_every;
    let total = records.len() as u64;
    let mut stats = BatchSummaryBuilder::new();

    log::info!(
        "Downloading {} files to {}",
        records.len(),
        output_root.display()
    );

    for (i, record) in records.iter().enumerate() {
        if stop.is_stopped() {
            log::info!("Download interrupted");
            break;
        }
        stop.report_progress(i as u64, total, format!("Downloading: {}", record.name));

        let outcome = match local_path_for(output_root, &record.path) {
            Some(local) => {
                transferrer
                    .transfer(&record.path, &local, Some(&record.stat()))
                    .await
            }
            None => {
                log::error!(
                    "Refusing to write {} outside {}",
                    record.path,
                    output_root.display()
                );
                TransferOutcome::Failed(FailReason::UnsafePath(record.path.clone()))
            }
        };
        stats.record(&outcome);

        let done = i + 1;
        if summary_every > 0 && done % summary_every == 0 {
            let so_far = stats.snapshot();
            log::info!(
                "Progress: {done}/{total} files, {:.1}% succeeded",
                so_far.success_rate().unwrap_or(0.0)
            );
        }
    }

    let summary = stats.build();
    stop.report_progress(
        summary.processed() as u64,
        total,
        format!("Downloaded {} of {total} files", summary.succeeded),
    );
    log::info!(
        "Download finished: {} succeeded ({} already present), {} failed, {} cancelled, {} written",
        summary.succeeded,
        summary.skipped,
        summary.failed,
        summary.cancelled,
        format_bytes(summary.bytes)
    );
    summary
}
