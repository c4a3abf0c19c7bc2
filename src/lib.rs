//! afc-dl - A library for pulling photos and videos off an iOS device.
//!
//! The device's filesystem is reached through a [`RemoteService`] whose set of
//! primitives varies between devices and service versions. The engine probes
//! what is available once, then discovers media roots, scans them with bounded
//! depth and fan-out, and copies files one at a time, falling back across
//! transfer strategies. Every stage can be stopped through a shared
//! [`StopToken`] and returns partial results when it is.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use afc_dl::{EngineConfig, MediaFilter, MediaSession, MountedService, StopToken};
//!
//! # async fn example() -> afc_dl::Result<()> {
//! // A device filesystem mounted into the local tree
//! let service = MountedService::new("/mnt/iphone");
//! let session = MediaSession::connect(service, EngineConfig::default(), StopToken::new()).await?;
//!
//! let analysis = session.analyze().await;
//! println!("{} photos, {} videos", analysis.image_count(), analysis.video_count());
//!
//! let summary = session
//!     .download(&analysis, MediaFilter::All, Path::new("./iphone_photos"))
//!     .await;
//! println!("Downloaded {} files, {} failed", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod accessor;
pub mod analysis;
pub mod batch;
pub mod cancel;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod format;
pub mod fs;
pub mod media;
pub mod remote;
pub mod scanner;
pub mod session;
pub mod stats;
pub mod transfer;

// Re-export main types for convenience
pub use accessor::DirectoryAccessor;
pub use analysis::{AnalysisResult, FileRecord, MediaFilter, collect_records};
pub use batch::download_all;
pub use cancel::{NoProgress, ProgressEvent, ProgressSink, StopToken};
pub use config::{AppConfig, EngineConfig, PathConfig};
pub use discovery::discover_roots;
pub use error::{Error, Result};
pub use fs::{FileSystem, TokioFileSystem};
pub use media::{MediaKind, is_media_file, media_kind};
pub use remote::{CapabilitySet, MountedService, Primitive, RemoteError, RemoteService, RemoteStat};
pub use scanner::Scanner;
pub use session::MediaSession;
pub use stats::BatchSummary;
pub use transfer::{FailReason, Strategy, TransferOutcome, Transferrer};
