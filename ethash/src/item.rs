//! Per-epoch cache and dataset items, each generated at most once.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Condvar, Mutex};

use crate::algorithm::{
    cache_size, dataset_size, generate_cache, generate_dataset, seed_hash, TEST_CACHE_BYTES,
    TEST_DATASET_BYTES,
};
use crate::dump::{load_or_generate, DumpKind, DumpTarget, Memory};
use crate::stats::EthashStats;
use crate::store::EpochItem;

const NOT_STARTED: u8 = 0;
const IN_PROGRESS: u8 = 1;
const DONE: u8 = 2;

/// Runs a generator exactly once; concurrent callers block until the single
/// winner finishes and then share its value.
///
/// If the generator panics the guard returns to the not-started state and
/// one of the waiters takes over.
///
/// Background work is handed out separately through [`try_schedule`], so
/// that a caller polling a slow generation starts at most one worker.
///
/// [`try_schedule`]: GenerateOnce::try_schedule
pub struct GenerateOnce<T> {
    state: AtomicU8,
    scheduled: AtomicBool,
    value: OnceLock<T>,
    lock: Mutex<()>,
    ready: Condvar,
}

impl<T> Default for GenerateOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GenerateOnce<T> {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(NOT_STARTED),
            scheduled: AtomicBool::new(false),
            value: OnceLock::new(),
            lock: Mutex::new(()),
            ready: Condvar::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) == DONE
    }

    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Claim the right to run generation in the background. Returns `true`
    /// for exactly one caller until that generation is abandoned.
    pub fn try_schedule(&self) -> bool {
        !self.is_done()
            && self
                .scheduled
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    pub fn get_or_generate<F: FnOnce() -> T>(&self, generate: F) -> &T {
        if let Some(value) = self.value.get() {
            return value;
        }

        {
            let mut guard = self.lock.lock();
            loop {
                if let Some(value) = self.value.get() {
                    return value;
                }
                match self.state.compare_exchange(
                    NOT_STARTED,
                    IN_PROGRESS,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => break,
                    Err(_) => self.ready.wait(&mut guard),
                }
            }
        }

        let mut claim = Claim {
            once: self,
            finished: false,
        };
        let value = self.value.get_or_init(generate);
        claim.finished = true;

        let _guard = self.lock.lock();
        self.state.store(DONE, Ordering::Release);
        self.ready.notify_all();
        value
    }
}

/// Resets an abandoned generation so a waiter can retry it.
struct Claim<'a, T> {
    once: &'a GenerateOnce<T>,
    finished: bool,
}

impl<T> Drop for Claim<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            let _guard = self.once.lock.lock();
            self.once.scheduled.store(false, Ordering::Release);
            self.once.state.store(NOT_STARTED, Ordering::Release);
            self.once.ready.notify_all();
        }
    }
}

/// Disk and sizing options shared by every generation of one item kind.
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    /// Counters updated as buffers are loaded or generated.
    pub stats: Arc<EthashStats>,
    /// Directory for dumps; `None` keeps items in memory only.
    pub dir: Option<PathBuf>,
    /// Number of past epochs whose dumps are kept on disk.
    pub limit: u64,
    /// Lock mapped dumps into RAM.
    pub lock: bool,
    /// Use the tiny test sizes.
    pub test: bool,
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Verification cache of one epoch.
pub struct CacheItem {
    epoch: u64,
    epoch_length: u64,
    memory: GenerateOnce<Memory>,
}

impl CacheItem {
    pub fn new(epoch: u64, epoch_length: u64) -> Self {
        Self {
            epoch,
            epoch_length,
            memory: GenerateOnce::new(),
        }
    }

    /// Generate (or load) the cache, blocking until it is available.
    pub fn generate(&self, options: &GenerateOptions) -> &[u32] {
        self.memory
            .get_or_generate(|| {
                let seed = seed_hash(self.epoch, self.epoch_length);
                let size = if options.test {
                    TEST_CACHE_BYTES
                } else {
                    cache_size(self.epoch)
                };
                let target = DumpTarget {
                    kind: DumpKind::Cache,
                    dir: options.dir.as_deref(),
                    epoch: self.epoch,
                    seed: &seed,
                    size,
                    limit: options.limit,
                    lock: options.lock,
                };
                let (memory, source) = load_or_generate(target, |dest| {
                    generate_cache(dest, self.epoch, self.epoch_length, &seed)
                });
                options.stats.record_source(DumpKind::Cache, source);
                memory
            })
            .words()
    }

    /// The cache words, if generation has finished.
    pub fn words(&self) -> Option<&[u32]> {
        self.memory.get().map(Memory::words)
    }

    pub fn is_generated(&self) -> bool {
        self.memory.is_done()
    }

    pub fn is_mapped(&self) -> bool {
        self.memory.get().is_some_and(Memory::is_mapped)
    }
}

impl EpochItem for CacheItem {
    const KIND: DumpKind = DumpKind::Cache;

    fn new(epoch: u64, epoch_length: u64) -> Self {
        CacheItem::new(epoch, epoch_length)
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn epoch_length(&self) -> u64 {
        self.epoch_length
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Full mining dataset of one epoch.
pub struct DatasetItem {
    epoch: u64,
    epoch_length: u64,
    memory: GenerateOnce<Memory>,
}

impl DatasetItem {
    pub fn new(epoch: u64, epoch_length: u64) -> Self {
        Self {
            epoch,
            epoch_length,
            memory: GenerateOnce::new(),
        }
    }

    /// Generate (or load) the dataset, blocking until it is available.
    ///
    /// The intermediate cache is only built when no usable dump exists.
    pub fn generate(&self, options: &GenerateOptions) -> &[u32] {
        self.memory
            .get_or_generate(|| {
                let seed = seed_hash(self.epoch, self.epoch_length);
                let (cache_bytes, dataset_bytes) = if options.test {
                    (TEST_CACHE_BYTES, TEST_DATASET_BYTES)
                } else {
                    (cache_size(self.epoch), dataset_size(self.epoch))
                };
                let target = DumpTarget {
                    kind: DumpKind::Dataset,
                    dir: options.dir.as_deref(),
                    epoch: self.epoch,
                    seed: &seed,
                    size: dataset_bytes,
                    limit: options.limit,
                    lock: options.lock,
                };
                let (memory, source) = load_or_generate(target, |dest| {
                    let mut cache = vec![0u32; (cache_bytes / 4) as usize];
                    generate_cache(&mut cache, self.epoch, self.epoch_length, &seed);
                    generate_dataset(dest, self.epoch, self.epoch_length, &cache);
                });
                options.stats.record_source(DumpKind::Dataset, source);
                memory
            })
            .words()
    }

    /// Whether the dataset is ready for full verification.
    pub fn generated(&self) -> bool {
        self.memory.is_done()
    }

    /// Claim background generation of this dataset; see
    /// [`GenerateOnce::try_schedule`].
    pub fn try_schedule(&self) -> bool {
        self.memory.try_schedule()
    }

    pub fn words(&self) -> Option<&[u32]> {
        self.memory.get().map(Memory::words)
    }

    pub fn is_mapped(&self) -> bool {
        self.memory.get().is_some_and(Memory::is_mapped)
    }
}

impl EpochItem for DatasetItem {
    const KIND: DumpKind = DumpKind::Dataset;

    fn new(epoch: u64, epoch_length: u64) -> Self {
        DatasetItem::new(epoch, epoch_length)
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn epoch_length(&self) -> u64 {
        self.epoch_length
    }
}
