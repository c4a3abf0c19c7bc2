//! Configuration types for scan and transfer operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discovery::DEFAULT_CANDIDATE_ROOTS;
use crate::transfer::Strategy;

const MIB: u64 = 1024 * 1024;

/// Tuning for the traversal and transfer engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum recursion depth for a scan. A depth of 0 scans nothing.
    pub max_depth: usize,
    /// Subdirectories followed per directory; the rest are skipped.
    pub max_subdirs: usize,
    /// Read size for streamed copies, in bytes.
    pub chunk_size: usize,
    /// Files larger than this report per-chunk progress.
    pub chunk_progress_threshold: u64,
    /// Scan progress is reported each time this many media files are found.
    pub scan_progress_every: usize,
    /// Stat progress is reported every this many files.
    pub stat_progress_every: usize,
    /// A batch summary is logged every this many files.
    pub summary_every: usize,
    /// Transfer strategies in the order they are attempted.
    pub strategy_order: Vec<Strategy>,
    /// Root paths probed by discovery, in order.
    pub candidate_roots: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_subdirs: 20,
            chunk_size: 512 * 1024,
            chunk_progress_threshold: 5 * MIB,
            scan_progress_every: 20,
            stat_progress_every: 50,
            summary_every: 10,
            strategy_order: Strategy::DEFAULT_ORDER.to_vec(),
            candidate_roots: DEFAULT_CANDIDATE_ROOTS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum scan depth.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the per-directory subdirectory cap.
    #[must_use]
    pub const fn with_max_subdirs(mut self, cap: usize) -> Self {
        self.max_subdirs = cap;
        self
    }

    /// Sets the streamed-copy chunk size.
    #[must_use]
    pub const fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the size above which chunk progress is reported.
    #[must_use]
    pub const fn with_chunk_progress_threshold(mut self, bytes: u64) -> Self {
        self.chunk_progress_threshold = bytes;
        self
    }

    /// Sets the transfer strategy order.
    #[must_use]
    pub fn with_strategy_order(mut self, order: Vec<Strategy>) -> Self {
        self.strategy_order = order;
        self
    }

    /// Sets the discovery candidate roots.
    #[must_use]
    pub fn with_candidate_roots(mut self, roots: Vec<String>) -> Self {
        self.candidate_roots = roots;
        self
    }
}

/// Path configuration for output and configuration directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory where downloaded files are mirrored.
    pub output_dir: PathBuf,
    /// Directory where the configuration file is read from.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            output_dir: PathBuf::from("./iphone_photos"),
            config_dir: config_dir.join("afc-dl"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine tuning.
    pub engine: EngineConfig,
    /// Path configuration.
    pub paths: PathConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathConfig::default().config_dir.join("config.toml")
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the text is not valid configuration.
    pub fn from_toml(text: &str) -> crate::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("Loaded config from {}", path.display());
                let mut config = Self::from_toml(&text)?;
                if let Some(dir) = path.parent() {
                    config.paths.config_dir = dir.to_path_buf();
                }
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
