//! Counters for hashimoto evaluations and for how resident buffers were
//! obtained.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dump::{DumpKind, Source};

/// Lock-free counters shared by an [`Ethash`](crate::Ethash) context and the
/// generations it starts.
#[derive(Debug, Default)]
pub struct EthashStats {
    light_hashes: AtomicU64,
    full_hashes: AtomicU64,
    full_unavailable: AtomicU64,
    caches_generated: AtomicU64,
    caches_loaded: AtomicU64,
    datasets_generated: AtomicU64,
    datasets_loaded: AtomicU64,
    background_generations: AtomicU64,
}

/// Point-in-time copy of [`EthashStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub light_hashes: u64,
    pub full_hashes: u64,
    /// Full evaluations refused because the dataset was not ready.
    pub full_unavailable: u64,
    pub caches_generated: u64,
    /// Caches mapped from an existing dump.
    pub caches_loaded: u64,
    pub datasets_generated: u64,
    pub datasets_loaded: u64,
    /// Generation threads started.
    pub background_generations: u64,
}

impl EthashStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_light(&self) {
        self.light_hashes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_full(&self) {
        self.full_hashes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_full_unavailable(&self) {
        self.full_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_background_generation(&self) {
        self.background_generations.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a cache or dataset that became resident.
    pub fn record_source(&self, kind: DumpKind, source: Source) {
        let counter = match (kind, source) {
            (DumpKind::Cache, Source::Generated) => &self.caches_generated,
            (DumpKind::Cache, Source::Disk) => &self.caches_loaded,
            (DumpKind::Dataset, Source::Generated) => &self.datasets_generated,
            (DumpKind::Dataset, Source::Disk) => &self.datasets_loaded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            light_hashes: self.light_hashes.load(Ordering::Relaxed),
            full_hashes: self.full_hashes.load(Ordering::Relaxed),
            full_unavailable: self.full_unavailable.load(Ordering::Relaxed),
            caches_generated: self.caches_generated.load(Ordering::Relaxed),
            caches_loaded: self.caches_loaded.load(Ordering::Relaxed),
            datasets_generated: self.datasets_generated.load(Ordering::Relaxed),
            datasets_loaded: self.datasets_loaded.load(Ordering::Relaxed),
            background_generations: self.background_generations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counts_from_many_threads() {
        let stats = Arc::new(EthashStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..250 {
                        stats.record_light();
                    }
                    stats.record_full();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.light_hashes, 1000);
        assert_eq!(snapshot.full_hashes, 4);
        assert_eq!(snapshot.full_unavailable, 0);
    }

    #[test]
    fn sources_are_counted_per_kind() {
        let stats = EthashStats::new();
        stats.record_source(DumpKind::Cache, Source::Disk);
        stats.record_source(DumpKind::Cache, Source::Generated);
        stats.record_source(DumpKind::Dataset, Source::Disk);
        stats.record_source(DumpKind::Dataset, Source::Disk);

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                caches_generated: 1,
                caches_loaded: 1,
                datasets_loaded: 2,
                ..StatsSnapshot::default()
            }
        );
    }
}
