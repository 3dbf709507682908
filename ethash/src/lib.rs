//! Ethash proof-of-work.
//!
//! The hashing core (cache and dataset generation, hashimoto) plus the
//! per-epoch stores that keep recently used buffers in memory, persist them
//! as memory-mapped dumps, and prepare the next epoch ahead of time.

pub mod algorithm;
pub mod config;
pub mod dump;
pub mod error;
pub mod ethash;
pub mod item;
pub mod stats;
pub mod store;

pub use algorithm::{
    cache_size, calc_epoch, calc_epoch_length, dataset_size, hashimoto_full, hashimoto_light,
    seed_hash, PowOutput, EPOCH_LENGTH_DEFAULT, EPOCH_LENGTH_ECIP1099,
};
pub use config::{EthashConfig, PowMode};
pub use error::EthashError;
pub use ethash::Ethash;
pub use item::{CacheItem, DatasetItem, GenerateOnce, GenerateOptions};
pub use stats::{EthashStats, StatsSnapshot};
pub use store::{EpochItem, EpochStore};
