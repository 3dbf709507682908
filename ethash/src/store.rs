//! Bounded in-memory store of per-epoch items with one look-ahead item.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::algorithm::{EPOCH_LENGTH_DEFAULT, EPOCH_LENGTH_ECIP1099, MAX_EPOCH};
use crate::dump::DumpKind;

/// An item keyed by epoch that an [`EpochStore`] can create on demand.
pub trait EpochItem: Send + Sync {
    const KIND: DumpKind;

    fn new(epoch: u64, epoch_length: u64) -> Self;
    fn epoch(&self) -> u64;
    fn epoch_length(&self) -> u64;
}

/// LRU of recently used epochs plus the item for the epoch after the
/// furthest one requested so far.
///
/// Items are handed out as `Arc`s; an evicted item stays alive until its
/// last user drops it.
pub struct EpochStore<T: EpochItem> {
    inner: Mutex<StoreInner<T>>,
    ecip1099_block: Option<u64>,
}

struct StoreInner<T> {
    items: LruCache<(u64, u64), Arc<T>>,
    future: Option<Arc<T>>,
}

impl<T: EpochItem> EpochStore<T> {
    /// `capacity` is clamped to at least one item.
    pub fn new(capacity: usize, ecip1099_block: Option<u64>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(StoreInner {
                items: LruCache::new(capacity),
                future: None,
            }),
            ecip1099_block,
        }
    }

    /// Fetch (or create) the item for `epoch`.
    ///
    /// The second element is a newly allocated look-ahead item for the
    /// following epoch, returned only when the caller should start generating
    /// it.
    pub fn get(&self, epoch: u64, epoch_length: u64) -> (Arc<T>, Option<Arc<T>>) {
        let mut inner = self.inner.lock();

        let key = (epoch, epoch_length);
        let item = match inner.items.get(&key) {
            Some(item) => Arc::clone(item),
            None => {
                let item = match &inner.future {
                    Some(future)
                        if future.epoch() == epoch && future.epoch_length() == epoch_length =>
                    {
                        Arc::clone(future)
                    }
                    _ => {
                        trace!(kind = T::KIND.describe(), epoch, "Requiring new ethash item");
                        Arc::new(T::new(epoch, epoch_length))
                    }
                };
                inner.items.put(key, Arc::clone(&item));
                item
            }
        };

        let (next_epoch, next_length) = self.next_epoch(epoch, epoch_length);
        let next_start = next_epoch * next_length;
        let behind = inner
            .future
            .as_ref()
            .map_or(true, |f| f.epoch() * f.epoch_length() < next_start);

        let mut future = None;
        if epoch < MAX_EPOCH - 1 && behind {
            trace!(kind = T::KIND.describe(), epoch = next_epoch, "Requiring new future ethash item");
            let next = Arc::new(T::new(next_epoch, next_length));
            inner.future = Some(Arc::clone(&next));
            future = Some(next);
        }

        (item, future)
    }

    /// The epoch following `epoch`, re-expressed in the longer epoch length
    /// when ECIP-1099 activates exactly at its first block.
    fn next_epoch(&self, epoch: u64, epoch_length: u64) -> (u64, u64) {
        let next = epoch + 1;
        match self.ecip1099_block {
            Some(block) if epoch_length == EPOCH_LENGTH_DEFAULT && next * epoch_length == block => {
                (next / 2, EPOCH_LENGTH_ECIP1099)
            }
            _ => (next, epoch_length),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current look-ahead item, if any.
    pub fn future(&self) -> Option<Arc<T>> {
        self.inner.lock().future.clone()
    }

    /// Drop every held item. Memory is released once outstanding users let go.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        inner.future = None;
    }
}
