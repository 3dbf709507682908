//! The Ethash context: per-epoch cache and dataset stores plus the
//! hashimoto entry points used by seal verification.

use std::sync::Arc;
use std::thread;

use tracing::{debug, error};

use crate::algorithm::{
    calc_epoch, calc_epoch_length, dataset_size, hashimoto_full, hashimoto_light, PowOutput,
    EPOCH_LENGTH_ECIP1099, TEST_DATASET_BYTES,
};
use crate::config::{EthashConfig, PowMode};
use crate::item::{CacheItem, DatasetItem, GenerateOptions};
use crate::stats::EthashStats;
use crate::store::EpochStore;

/// Epochs whose dataset is generated synchronously because they are the
/// first with the ECIP-1099 epoch length on Mordor (42) and Classic (195).
const ECIP1099_TRANSITION_EPOCHS: [u64; 2] = [42, 195];

/// Shared cache/dataset state. Cheap to share behind an `Arc`.
pub struct Ethash {
    config: EthashConfig,
    caches: EpochStore<CacheItem>,
    datasets: EpochStore<DatasetItem>,
    cache_options: GenerateOptions,
    dataset_options: GenerateOptions,
    stats: Arc<EthashStats>,
}

impl Ethash {
    pub fn new(config: EthashConfig) -> Self {
        let test = config.pow_mode == PowMode::Test;
        let stats = Arc::new(EthashStats::new());
        let cache_options = GenerateOptions {
            stats: Arc::clone(&stats),
            dir: config.cache_dir.clone(),
            limit: config.caches_on_disk,
            lock: config.caches_lock_mmap,
            test,
        };
        let dataset_options = GenerateOptions {
            stats: Arc::clone(&stats),
            dir: config.dataset_dir.clone(),
            limit: config.datasets_on_disk,
            lock: config.datasets_lock_mmap,
            test,
        };
        debug!(
            mode = %config.pow_mode,
            caches_in_mem = config.caches_in_mem,
            datasets_in_mem = config.datasets_in_mem,
            "Created ethash context"
        );
        Self {
            caches: EpochStore::new(config.caches_in_mem, config.ecip1099_block),
            datasets: EpochStore::new(config.datasets_in_mem, config.ecip1099_block),
            cache_options,
            dataset_options,
            stats,
            config,
        }
    }

    pub fn config(&self) -> &EthashConfig {
        &self.config
    }

    pub fn stats(&self) -> &EthashStats {
        &self.stats
    }

    /// Epoch and epoch length in force at `block`.
    pub fn epoch_at(&self, block: u64) -> (u64, u64) {
        let length = calc_epoch_length(block, self.config.ecip1099_block);
        (calc_epoch(block, length), length)
    }

    /// The verification cache for `block`, generated before returning.
    ///
    /// A newly allocated look-ahead cache is generated in the background.
    pub fn cache(&self, block: u64) -> Arc<CacheItem> {
        let (epoch, length) = self.epoch_at(block);
        let (current, future) = self.caches.get(epoch, length);
        current.generate(&self.cache_options);

        if let Some(future) = future {
            let options = self.cache_options.clone();
            self.spawn_generation("ethash-cache", move || {
                future.generate(&options);
            });
        }
        current
    }

    /// The dataset for `block`.
    ///
    /// With `asynchronous` set, an ungenerated dataset is built in the
    /// background and returned immediately; check
    /// [`DatasetItem::generated`] before use. Repeated calls while that
    /// generation runs do not start another one.
    pub fn dataset(&self, block: u64, asynchronous: bool) -> Arc<DatasetItem> {
        let (epoch, length) = self.epoch_at(block);
        let (current, future) = self.datasets.get(epoch, length);

        let forced_sync =
            length == EPOCH_LENGTH_ECIP1099 && ECIP1099_TRANSITION_EPOCHS.contains(&epoch);
        let asynchronous = asynchronous && !forced_sync;

        if asynchronous && !current.generated() {
            if current.try_schedule() || future.is_some() {
                // Builds the current dataset, or waits for its scheduled
                // generation, before moving on to the look-ahead.
                let options = self.dataset_options.clone();
                let item = Arc::clone(&current);
                self.spawn_generation("ethash-dataset", move || {
                    item.generate(&options);
                    if let Some(future) = future {
                        future.generate(&options);
                    }
                });
            }
        } else {
            current.generate(&self.dataset_options);
            if let Some(future) = future {
                let options = self.dataset_options.clone();
                self.spawn_generation("ethash-dataset", move || {
                    future.generate(&options);
                });
            }
        }
        current
    }

    /// Evaluate hashimoto for `block` against its verification cache.
    pub fn hashimoto_light(&self, block: u64, hash: &[u8; 32], nonce: u64) -> PowOutput {
        let (epoch, _) = self.epoch_at(block);
        let size = if self.cache_options.test {
            TEST_DATASET_BYTES
        } else {
            dataset_size(epoch)
        };
        let cache = self.cache(block);
        self.stats.record_light();
        hashimoto_light(size, cache.generate(&self.cache_options), hash, nonce)
    }

    /// Evaluate hashimoto against the full dataset, or `None` while the
    /// dataset is still being generated.
    pub fn hashimoto_full(&self, block: u64, hash: &[u8; 32], nonce: u64) -> Option<PowOutput> {
        let dataset = self.dataset(block, true);
        match dataset.words() {
            Some(words) if dataset.generated() => {
                self.stats.record_full();
                Some(hashimoto_full(words, hash, nonce))
            }
            _ => {
                self.stats.record_full_unavailable();
                None
            }
        }
    }

    /// Release every resident cache and dataset.
    ///
    /// Items still referenced elsewhere (e.g. by a background generation)
    /// are freed once that reference is dropped.
    pub fn close(&self) {
        self.caches.clear();
        self.datasets.clear();
        debug!("Closed ethash context");
    }

    fn spawn_generation<F>(&self, name: &str, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match thread::Builder::new().name(name.to_string()).spawn(work) {
            Ok(_) => self.stats.record_background_generation(),
            Err(err) => error!(%err, name, "Failed to spawn ethash generation thread"),
        }
    }
}
