//! User configuration
//!
//! Read from `<config_dir>/git-ipfs-mirror/config.toml`. A missing file
//! means defaults; a present file is parsed and validated before use.

use anyhow::{Context, Result};
use mirror_core::push::DEFAULT_MAX_OBJECT_SIZE;
use mirror_core::{ContentId, PushOptions, VisitedBackend, EMPTY_ROOT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the config file location (mainly for tests and scripting)
pub const CONFIG_PATH_ENV: &str = "GIT_IPFS_MIRROR_CONFIG";

const MIN_OBJECT_SIZE: usize = 1 << 10;
const MAX_OBJECT_SIZE: usize = 64 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// API base URL; discovered from the local node when unset
    pub api_url: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub max_object_size: usize,
    /// `memory` or `sled`
    pub visited: String,
    /// Container patched when no existing root is given
    pub empty_root: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
            visited: "memory".to_string(),
            empty_root: EMPTY_ROOT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub ipfs: IpfsConfig,
    pub push: PushConfig,
}

impl MirrorConfig {
    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: MirrorConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Check ranges and names
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.ipfs.timeout_secs) {
            anyhow::bail!(
                "ipfs.timeout_secs must be between 1 and 3600 (got {})",
                self.ipfs.timeout_secs
            );
        }
        if !(MIN_OBJECT_SIZE..=MAX_OBJECT_SIZE).contains(&self.push.max_object_size) {
            anyhow::bail!(
                "push.max_object_size must be between {} and {} (got {})",
                MIN_OBJECT_SIZE,
                MAX_OBJECT_SIZE,
                self.push.max_object_size
            );
        }
        self.visited_backend()?;
        self.empty_root()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.ipfs.timeout_secs)
    }

    pub fn push_options(&self) -> PushOptions {
        PushOptions {
            max_object_size: self.push.max_object_size,
        }
    }

    pub fn visited_backend(&self) -> Result<VisitedBackend> {
        VisitedBackend::parse(&self.push.visited).with_context(|| {
            format!(
                "push.visited must be 'memory' or 'sled' (got '{}')",
                self.push.visited
            )
        })
    }

    pub fn empty_root(&self) -> Result<ContentId> {
        ContentId::parse(&self.push.empty_root).context("push.empty_root is not a valid CID")
    }
}

/// Where the config file lives
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("git-ipfs-mirror").join("config.toml"))
}

/// Load and validate the user's configuration
pub fn load() -> Result<MirrorConfig> {
    let config = match config_file_path() {
        Some(path) if path.exists() => MirrorConfig::from_file(&path)?,
        _ => MirrorConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
