//! Depth- and fan-out-bounded recursive media scan.

use futures::future::BoxFuture;

use crate::accessor::DirectoryAccessor;
use crate::config::EngineConfig;
use crate::media::is_media_file;
use crate::remote::{RemoteService, join_remote};

/// Walks a remote tree collecting media file paths.
///
/// Keeps a running count of media files found across every `scan` call made
/// through the same scanner, so progress is continuous over several roots.
pub struct Scanner<'a, S: RemoteService> {
    accessor: &'a DirectoryAccessor<S>,
    max_subdirs: usize,
    progress_every: usize,
    found: usize,
}

impl<'a, S: RemoteService> Scanner<'a, S> {
    /// Creates a scanner using the fan-out and progress settings of `config`.
    #[must_use]
    pub const fn new(accessor: &'a DirectoryAccessor<S>, config: &EngineConfig) -> Self {
        Self {
            accessor,
            max_subdirs: config.max_subdirs,
            progress_every: config.scan_progress_every,
            found: 0,
        }
    }

    /// Total media files found so far.
    #[must_use]
    pub const fn found(&self) -> usize {
        self.found
    }

    /// Returns the media files under `root`, at most `max_depth` levels deep.
    ///
    /// Files of a directory come before those of its subdirectories, each in
    /// listing order. Only the first `max_subdirs` subdirectories of each
    /// directory are followed. A stop request ends the walk and returns what
    /// has been collected.
    pub async fn scan(&mut self, root: &str, max_depth: usize) -> Vec<String> {
        let mut out = Vec::new();
        self.scan_dir(root.to_string(), max_depth, &mut out).await;
        out
    }

    fn scan_dir<'s>(
        &'s mut self,
        dir: String,
        depth: usize,
        out: &'s mut Vec<String>,
    ) -> BoxFuture<'s, ()> {
        Box::pin(async move {
            let accessor = self.accessor;
            let stop = accessor.stop_token();
            if depth == 0 || stop.is_stopped() {
                return;
            }
            let Some(entries) = accessor.list(&dir).await else {
                return;
            };

            let mut subdirs = Vec::new();
            for name in entries {
                if stop.is_stopped() {
                    break;
                }
                let path = join_remote(&dir, &name);
                match accessor.try_is_directory(&path).await {
                    Ok(true) => subdirs.push(path),
                    Ok(false) if is_media_file(&name) => {
                        out.push(path);
                        self.found += 1;
                        if self.progress_every > 0 && self.found % self.progress_every == 0 {
                            stop.report_progress(
                                self.found as u64,
                                0,
                                format!("Found {} media files", self.found),
                            );
                        }
                    }
                    Ok(false) => {}
                    Err(e) => log::debug!("Skipping {path}: {e}"),
                }
            }

            if subdirs.len() > self.max_subdirs {
                log::debug!(
                    "{dir}: following {} of {} subdirectories",
                    self.max_subdirs,
                    subdirs.len()
                );
                subdirs.truncate(self.max_subdirs);
            }

            for subdir in subdirs {
                if stop.is_stopped() {
                    break;
                }
                self.scan_dir(subdir, depth - 1, out).await;
            }
        })
    }
}
