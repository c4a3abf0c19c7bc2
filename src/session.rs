//! A connected device session: discover, scan, analyze, download.

use std::collections::HashSet;
use std::path::Path;

use crate::accessor::DirectoryAccessor;
use crate::analysis::{AnalysisResult, MediaFilter, collect_records};
use crate::batch::download_all;
use crate::cancel::StopToken;
use crate::config::EngineConfig;
use crate::discovery;
use crate::error::{Error, Result};
use crate::format::format_bytes;
use crate::remote::{CapabilitySet, RemoteService};
use crate::scanner::Scanner;
use crate::stats::BatchSummary;
use crate::transfer::Transferrer;

/// Scan-progress units allotted to each discovered root.
const ROOT_PROGRESS_SPAN: u64 = 50;

/// High-level entry point over one remote service.
///
/// Every stage runs sequentially on the single accessor; the stop token passed
/// to [`MediaSession::connect`] is polled by all of them.
pub struct MediaSession<S: RemoteService> {
    accessor: DirectoryAccessor<S>,
    config: EngineConfig,
}

impl<S: RemoteService> MediaSession<S> {
    /// Probes the service and checks that its root directory can be listed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceUnavailable`] if `/` cannot be listed.
    pub async fn connect(service: S, config: EngineConfig, stop: StopToken) -> Result<Self> {
        let accessor = DirectoryAccessor::new(service, stop);
        let Some(root) = accessor.list("/").await else {
            log::error!("Cannot list the device root");
            return Err(Error::ServiceUnavailable);
        };
        log::info!("Connected: {} entries at the device root", root.len());
        Ok(Self { accessor, config })
    }

    /// Returns the directory accessor.
    #[must_use]
    pub const fn accessor(&self) -> &DirectoryAccessor<S> {
        &self.accessor
    }

    /// Returns the capabilities probed at connect time.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilitySet {
        self.accessor.capabilities()
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the stop token shared by every stage of this session.
    #[must_use]
    pub const fn stop_token(&self) -> &StopToken {
        self.accessor.stop_token()
    }

    /// Media-bearing roots among the configured candidates.
    pub async fn discover_roots(&self) -> Vec<String> {
        discovery::discover_roots(&self.accessor, &self.config.candidate_roots).await
    }

    /// Media files under `root`, at most `max_depth` levels deep.
    pub async fn scan(&self, root: &str, max_depth: usize) -> Vec<String> {
        Scanner::new(&self.accessor, &self.config)
            .scan(root, max_depth)
            .await
    }

    /// Discovers roots, scans each of them and stats the media found.
    ///
    /// After a stop request the result covers whatever was collected; callers
    /// tell the two apart through [`StopToken::is_stopped`].
    pub async fn analyze(&self) -> AnalysisResult {
        let stop = self.stop_token();
        let roots = self.discover_roots().await;
        if roots.is_empty() {
            log::warn!("No photo directories found");
            return AnalysisResult::default();
        }

        let total = roots.len() as u64 * ROOT_PROGRESS_SPAN;
        let mut scanner = Scanner::new(&self.accessor, &self.config);
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for (i, root) in roots.iter().enumerate() {
            if stop.is_stopped() {
                break;
            }
            stop.report_progress(
                i as u64 * ROOT_PROGRESS_SPAN,
                total,
                format!("Scanning: {root}"),
            );
            for path in scanner.scan(root, self.config.max_depth).await {
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
        }
        log::info!("Found {} media files", paths.len());

        let records = collect_records(&self.accessor, &paths, self.config.stat_progress_every).await;
        let result = AnalysisResult::from_records(records);
        log::info!(
            "Analysis: {} images, {} videos, {} total",
            result.image_count(),
            result.video_count(),
            format_bytes(result.total_size_bytes())
        );
        result
    }

    /// Downloads the records of `analysis` selected by `filter` into `output`.
    pub async fn download(
        &self,
        analysis: &AnalysisResult,
        filter: MediaFilter,
        output: &Path,
    ) -> BatchSummary {
        let records = analysis.select(filter);
        let transferrer = Transferrer::new(&self.accessor, &self.config);
        download_all(&transferrer, &records, output).await
    }
}
