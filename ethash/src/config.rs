//! Ethash engine configuration with TOML file support.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EthashError;

/// How proof-of-work seals are checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowMode {
    /// Full-size caches and datasets.
    #[default]
    Normal,
    /// Tiny caches and datasets for tests.
    Test,
    /// Seals always pass unless the block matches the configured failure.
    Fake,
    /// Like `Fake`, with an artificial verification delay.
    PoissonFake,
    /// Every header check is skipped.
    FullFake,
}

impl PowMode {
    /// Modes that never touch the hashing core.
    pub fn is_fake(&self) -> bool {
        matches!(self, PowMode::Fake | PowMode::PoissonFake | PowMode::FullFake)
    }
}

impl fmt::Display for PowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowMode::Normal => "normal",
            PowMode::Test => "test",
            PowMode::Fake => "fake",
            PowMode::PoissonFake => "poisson_fake",
            PowMode::FullFake => "full_fake",
        };
        f.write_str(name)
    }
}

impl FromStr for PowMode {
    type Err = EthashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(PowMode::Normal),
            "test" => Ok(PowMode::Test),
            "fake" => Ok(PowMode::Fake),
            "poisson_fake" => Ok(PowMode::PoissonFake),
            "full_fake" => Ok(PowMode::FullFake),
            other => Err(EthashError::Config(format!("unknown pow mode: {other}"))),
        }
    }
}

/// Configuration for the cache and dataset stores.
///
/// Can be loaded from a TOML file via [`EthashConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EthashConfig {
    /// Directory for cache dumps; unset keeps caches in memory only.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Number of caches held in memory.
    #[serde(default = "default_caches_in_mem")]
    pub caches_in_mem: usize,

    /// Number of past cache epochs kept on disk.
    #[serde(default = "default_caches_on_disk")]
    pub caches_on_disk: u64,

    /// Lock mapped caches into RAM.
    #[serde(default)]
    pub caches_lock_mmap: bool,

    /// Directory for dataset dumps; unset keeps datasets in memory only.
    #[serde(default)]
    pub dataset_dir: Option<PathBuf>,

    #[serde(default = "default_datasets_in_mem")]
    pub datasets_in_mem: usize,

    #[serde(default = "default_datasets_on_disk")]
    pub datasets_on_disk: u64,

    #[serde(default)]
    pub datasets_lock_mmap: bool,

    #[serde(default)]
    pub pow_mode: PowMode,

    /// ECIP-1099 activation block (taken from the chain config, not TOML).
    #[serde(skip)]
    pub ecip1099_block: Option<u64>,

    /// Block number whose seal a fake mode rejects.
    #[serde(default)]
    pub fake_fail: Option<u64>,

    /// Artificial seal delay in milliseconds for `PoissonFake`.
    #[serde(default)]
    pub fake_delay_ms: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_caches_in_mem() -> usize {
    3
}

fn default_caches_on_disk() -> u64 {
    3
}

fn default_datasets_in_mem() -> usize {
    1
}

fn default_datasets_on_disk() -> u64 {
    2
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EthashConfig {
    /// In-memory test configuration with tiny buffers.
    pub fn test() -> Self {
        Self {
            pow_mode: PowMode::Test,
            caches_in_mem: 1,
            datasets_in_mem: 1,
            ..Self::default()
        }
    }

    /// A configuration in one of the fake modes.
    pub fn fake(mode: PowMode, fail: Option<u64>) -> Self {
        Self {
            pow_mode: mode,
            fake_fail: fail,
            ..Self::default()
        }
    }

    pub fn with_ecip1099_block(mut self, block: Option<u64>) -> Self {
        self.ecip1099_block = block;
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EthashError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EthashError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EthashError> {
        toml::from_str(s).map_err(|e| EthashError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EthashError> {
        toml::to_string_pretty(self).map_err(|e| EthashError::Config(e.to_string()))
    }
}

impl Default for EthashConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            caches_in_mem: default_caches_in_mem(),
            caches_on_disk: default_caches_on_disk(),
            caches_lock_mmap: false,
            dataset_dir: None,
            datasets_in_mem: default_datasets_in_mem(),
            datasets_on_disk: default_datasets_on_disk(),
            datasets_lock_mmap: false,
            pow_mode: PowMode::Normal,
            ecip1099_block: None,
            fake_fail: None,
            fake_delay_ms: 0,
        }
    }
}
