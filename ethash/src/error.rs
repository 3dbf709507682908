use std::path::PathBuf;

use thiserror::Error;

/// Configuration and on-disk dump failures.
///
/// Dump errors never reach a verification caller: generation falls back to
/// an in-memory buffer and logs them.
#[derive(Debug, Error)]
pub enum EthashError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid dump magic in {}", path.display())]
    InvalidDumpMagic { path: PathBuf },

    #[error("dump {} has invalid size {size}", path.display())]
    InvalidDumpSize { path: PathBuf, size: u64 },

    #[error("failed to persist dump {}: {reason}", path.display())]
    Persist { path: PathBuf, reason: String },
}
