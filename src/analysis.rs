//! File records and the aggregate result of a scan pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accessor::DirectoryAccessor;
use crate::media::{MediaKind, media_kind};
use crate::remote::{RemoteService, RemoteStat, remote_basename};

/// Metadata for one media file found on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute remote path.
    pub path: String,
    /// Final path component.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Remote modification time, if reported.
    pub modified: Option<DateTime<Utc>>,
    /// Remote creation time, if reported.
    pub created: Option<DateTime<Utc>>,
    /// Image or video, derived from the extension.
    pub kind: MediaKind,
}

impl FileRecord {
    /// The remote metadata this record was built from.
    #[must_use]
    pub const fn stat(&self) -> RemoteStat {
        RemoteStat {
            size: self.size,
            modified: self.modified,
            created: self.created,
        }
    }
}

/// Which records to select for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFilter {
    #[default]
    All,
    Images,
    Videos,
}

impl MediaFilter {
    /// Returns true if a record of `kind` passes the filter.
    #[must_use]
    pub const fn accepts(self, kind: MediaKind) -> bool {
        match self {
            Self::All => kind.is_media(),
            Self::Images => matches!(kind, MediaKind::Image),
            Self::Videos => matches!(kind, MediaKind::Video),
        }
    }
}

impl std::str::FromStr for MediaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "images" | "photos" => Ok(Self::Images),
            "videos" => Ok(Self::Videos),
            other => Err(format!("unknown media filter: {other}")),
        }
    }
}

/// Summary of a scan pass.
///
/// Only constructible from records, so the counts always agree with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    records: Vec<FileRecord>,
    image_count: usize,
    video_count: usize,
    total_size_bytes: u64,
}

impl AnalysisResult {
    /// Builds a result from records, dropping any that are not media.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = FileRecord>) -> Self {
        let records: Vec<_> = records.into_iter().filter(|r| r.kind.is_media()).collect();
        let image_count = records.iter().filter(|r| r.kind == MediaKind::Image).count();
        let video_count = records.iter().filter(|r| r.kind == MediaKind::Video).count();
        let total_size_bytes = records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.size));
        Self {
            records,
            image_count,
            video_count,
            total_size_bytes,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.records.len()
    }

    /// Number of image records.
    #[must_use]
    pub const fn image_count(&self) -> usize {
        self.image_count
    }

    /// Number of video records.
    #[must_use]
    pub const fn video_count(&self) -> usize {
        self.video_count
    }

    /// Sum of record sizes in bytes.
    #[must_use]
    pub const fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in scan order.
    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Records that pass `filter`, in scan order.
    #[must_use]
    pub fn select(&self, filter: MediaFilter) -> Vec<FileRecord> {
        self.records
            .iter()
            .filter(|r| filter.accepts(r.kind))
            .cloned()
            .collect()
    }
}

/// Stats one remote path into a record.
///
/// Returns `None` if the path is not media or cannot be stat'ed.
pub async fn file_record<S: RemoteService>(
    accessor: &DirectoryAccessor<S>,
    path: &str,
) -> Option<FileRecord> {
    let name = remote_basename(path);
    let kind = media_kind(name);
    if !kind.is_media() {
        return None;
    }
    let stat = accessor.stat(path).await?;
    Some(FileRecord {
        path: path.to_string(),
        name: name.to_string(),
        size: stat.size,
        modified: stat.modified,
        created: stat.created,
        kind,
    })
}

/// Stats each path in order, skipping the ones that fail.
///
/// Reports progress every `progress_every` paths and stops early, returning
/// what was collected, if the accessor's stop token is signalled.
pub async fn collect_records<S: RemoteService>(
    accessor: &DirectoryAccessor<S>,
    paths: &[String],
    progress_every: usize,
) -> Vec<FileRecord> {
    let stop = accessor.stop_token();
    let total = paths.len() as u64;
    let mut records = Vec::with_capacity(paths.len());

    for (i, path) in paths.iter().enumerate() {
        if stop.is_stopped() {
            break;
        }
        if let Some(record) = file_record(accessor, path).await {
            records.push(record);
        }
        let done = i + 1;
        if progress_every > 0 && done % progress_every == 0 {
            stop.report_progress(
                done as u64,
                total,
                format!("Processed {done}/{total} files"),
            );
        }
    }
    records
}
