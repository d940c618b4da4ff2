//! Analyzer configuration

use super::revision::DEFAULT_REVISION;
use crate::llm::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-repository configuration directory
pub const CONFIG_DIR: &str = ".kernel-lens";

const CONFIG_FILE: &str = "config.toml";

/// Configuration for an analysis session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Source tree to read snapshots from (defaults to the --repo path)
    #[serde(default)]
    pub repo_root: Option<PathBuf>,

    /// Revision used when none is given
    #[serde(default = "default_revision")]
    pub default_revision: String,

    /// Budget for each git invocation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub git_timeout_secs: u64,

    /// How snapshots are read
    #[serde(default)]
    pub snapshot_backend: SnapshotBackend,

    /// Concurrent declaration lookups (0 = one per CPU)
    #[serde(default)]
    pub workers: usize,

    /// Bound on cached cluster explanations
    #[serde(default = "default_cache_size")]
    pub explanation_cache_size: usize,

    /// Commit history service
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Explanation model; `--explain` falls back to generated summaries when absent
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

/// Snapshot reader implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackend {
    /// `git show` subprocesses
    #[default]
    Cli,
    /// In-process libgit2 object lookups
    Libgit2,
}

/// Commit tracker service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tracker_url")]
    pub base_url: String,

    /// Repository identifier understood by the tracker
    #[serde(default = "default_tracker_repo")]
    pub repo: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of commits to track (0 = all)
    #[serde(default)]
    pub track_num: u32,
}

fn default_revision() -> String {
    DEFAULT_REVISION.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_size() -> usize {
    128
}

fn default_tracker_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_tracker_repo() -> String {
    "linux-stable".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: default_tracker_url(),
            repo: default_tracker_repo(),
            timeout_secs: default_timeout_secs(),
            track_num: 0,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            repo_root: None,
            default_revision: default_revision(),
            git_timeout_secs: default_timeout_secs(),
            snapshot_backend: SnapshotBackend::default(),
            workers: 0,
            explanation_cache_size: default_cache_size(),
            tracker: TrackerConfig::default(),
            llm: None,
        }
    }
}

impl AnalyzerConfig {
    /// Load from an explicit file, the repository, the user config dir, or defaults
    pub fn load(explicit: Option<&Path>, repo_root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        let candidates = [
            Some(repo_root.join(CONFIG_DIR).join(CONFIG_FILE)),
            dirs::config_dir().map(|dir| dir.join("kernel-lens").join(CONFIG_FILE)),
        ];

        match candidates.into_iter().flatten().find(|p| p.exists()) {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Write the configuration into the repository's config directory
    pub fn save(&self, repo_root: &Path) -> Result<PathBuf> {
        let dir = repo_root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;

        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(path)
    }

    /// Source tree root, falling back to the given path
    pub fn source_root(&self, fallback: &Path) -> PathBuf {
        self.repo_root
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs.max(1))
    }

    /// Effective worker count for declaration lookups
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }
}
