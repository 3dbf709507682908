//! Concurrent batch verification with in-order results.
//!
//! Workers pull header indices from a shared counter and verify them
//! independently. A coordinator thread collects completions and releases
//! result `k` only once every result before it has been released, so the
//! caller observes results in input order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error};

use classic_crypto::header_hash;
use classic_types::{ChainHeaderReader, Header};

use crate::verifier::HeaderVerifier;
use crate::ConsensusError;

pub type VerifyResult = Result<(), ConsensusError>;

/// Handle to a running batch verification.
///
/// Results arrive in input order. Dropping the handle or calling
/// [`BatchVerification::abort`] stops dispatching further headers.
pub struct BatchVerification {
    abort: Arc<AtomicBool>,
    results: Receiver<VerifyResult>,
}

impl BatchVerification {
    /// A batch whose results are already known.
    pub fn ready(results: impl IntoIterator<Item = VerifyResult>) -> Self {
        let (tx, rx) = mpsc::channel();
        for result in results {
            // The receiver is alive in this scope.
            let _ = tx.send(result);
        }
        Self {
            abort: Arc::new(AtomicBool::new(false)),
            results: rx,
        }
    }

    /// Stop dispatching headers; the result stream closes early.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    /// An abort signal that can be shared with another thread.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// The next result in input order, or `None` once the stream is closed.
    pub fn next_result(&self) -> Option<VerifyResult> {
        self.results.recv().ok()
    }
}

impl Drop for BatchVerification {
    fn drop(&mut self) {
        self.abort.store(true, Ordering::SeqCst);
    }
}

impl Iterator for BatchVerification {
    type Item = VerifyResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_result()
    }
}

/// Number of workers for a batch of `len` headers.
pub fn worker_count(len: usize) -> usize {
    let available = thread::available_parallelism().map_or(1, |n| n.get());
    available.min(len).max(1)
}

/// Verify `headers` on `workers` threads.
///
/// `seals[i]` selects whether header `i`'s seal is checked. The parent of
/// the first header comes from `chain`; every later header's parent is its
/// predecessor in the batch, provided the hashes link.
pub fn verify_batch(
    verifier: HeaderVerifier,
    chain: Arc<dyn ChainHeaderReader>,
    headers: Vec<Header>,
    seals: Vec<bool>,
    now: u64,
    workers: usize,
) -> BatchVerification {
    let len = headers.len();
    let abort = Arc::new(AtomicBool::new(false));
    let (results_tx, results_rx) = mpsc::channel();
    let batch = BatchVerification {
        abort: Arc::clone(&abort),
        results: results_rx,
    };
    if len == 0 {
        return batch;
    }

    let shared = Arc::new(BatchInput {
        verifier,
        chain,
        headers,
        seals,
        now,
    });
    let next_index = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = mpsc::channel();

    let workers = workers.clamp(1, len);
    debug!(headers = len, workers, "Verifying header batch");
    for id in 0..workers {
        let shared = Arc::clone(&shared);
        let next_index = Arc::clone(&next_index);
        let abort = Arc::clone(&abort);
        let done_tx = done_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("verify-{id}"))
            .spawn(move || run_worker(&shared, &next_index, &abort, &done_tx));
        if let Err(err) = spawned {
            error!(%err, "Failed to spawn header verification worker");
        }
    }
    // Workers hold the remaining senders; the channel closes when they exit.
    drop(done_tx);

    let spawned = thread::Builder::new()
        .name("verify-coordinator".to_string())
        .spawn(move || coordinate(len, &done_rx, &results_tx, &abort));
    if let Err(err) = spawned {
        error!(%err, "Failed to spawn header verification coordinator");
    }
    batch
}

struct BatchInput {
    verifier: HeaderVerifier,
    chain: Arc<dyn ChainHeaderReader>,
    headers: Vec<Header>,
    seals: Vec<bool>,
    now: u64,
}

impl BatchInput {
    fn verify(&self, index: usize) -> VerifyResult {
        let header = &self.headers[index];
        let seal = self.seals.get(index).copied().unwrap_or(false);

        if index == 0 {
            let parent = header
                .number
                .checked_sub(1)
                .and_then(|number| self.chain.get_header(&header.parent_hash, number))
                .ok_or(ConsensusError::UnknownAncestor)?;
            return self.verifier.verify(header, &parent, false, seal, self.now);
        }

        let previous = &self.headers[index - 1];
        if header_hash(previous) != header.parent_hash {
            return Err(ConsensusError::UnknownAncestor);
        }
        self.verifier.verify(header, previous, false, seal, self.now)
    }
}

fn run_worker(
    input: &BatchInput,
    next_index: &AtomicUsize,
    abort: &AtomicBool,
    done: &Sender<(usize, VerifyResult)>,
) {
    loop {
        if abort.load(Ordering::SeqCst) {
            return;
        }
        let index = next_index.fetch_add(1, Ordering::SeqCst);
        if index >= input.headers.len() {
            return;
        }
        if done.send((index, input.verify(index))).is_err() {
            return;
        }
    }
}

fn coordinate(
    len: usize,
    done: &Receiver<(usize, VerifyResult)>,
    results: &Sender<VerifyResult>,
    abort: &AtomicBool,
) {
    let mut pending: Vec<Option<VerifyResult>> = (0..len).map(|_| None).collect();
    let mut out = 0;

    while out < len {
        let Ok((index, result)) = done.recv() else {
            return;
        };
        if abort.load(Ordering::SeqCst) {
            return;
        }
        pending[index] = Some(result);
        while let Some(result) = pending.get_mut(out).and_then(Option::take) {
            if results.send(result).is_err() {
                abort.store(true, Ordering::SeqCst);
                return;
            }
            out += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use alloy_primitives::U256;
    use classic_ethash::{Ethash, EthashConfig, PowMode};
    use classic_nullables::NullChain;
    use classic_types::{ChainConfig, EMPTY_UNCLE_HASH};

    use crate::difficulty::calc_difficulty;

    const NOW: u64 = 1_700_000_000;

    fn chain_config() -> ChainConfig {
        ChainConfig {
            eip2_block: Some(0),
            eip100b_block: Some(0),
            ecip1041_block: Some(0),
            ..ChainConfig::frontier()
        }
    }

    fn verifier() -> HeaderVerifier {
        HeaderVerifier::new(
            Arc::new(chain_config()),
            Arc::new(Ethash::new(EthashConfig::test())),
        )
    }

    /// A verifier whose seal checks each take 50ms. The returned `Ethash` is
    /// shared with every worker, so its strong count drops back to one once
    /// they have all exited.
    fn slow_verifier() -> (HeaderVerifier, Arc<Ethash>) {
        let ethash = Arc::new(Ethash::new(EthashConfig {
            fake_delay_ms: 50,
            ..EthashConfig::fake(PowMode::Fake, None)
        }));
        let verifier = HeaderVerifier::new(Arc::new(chain_config()), Arc::clone(&ethash));
        (verifier, ethash)
    }

    fn wait_until(limit: Duration, mut ready: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if ready() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        ready()
    }

    fn genesis() -> Header {
        Header {
            number: 0,
            time: NOW - 10_000,
            difficulty: U256::from(1_000_000u64),
            gas_limit: 8_000_000,
            uncle_hash: EMPTY_UNCLE_HASH,
            ..Header::default()
        }
    }

    fn extend(verifier: &HeaderVerifier, parent: &Header, count: usize) -> Vec<Header> {
        let mut headers: Vec<Header> = Vec::with_capacity(count);
        for i in 0..count {
            let parent = headers.last().unwrap_or(parent);
            let time = parent.time + 10 + i as u64 % 7;
            headers.push(Header {
                number: parent.number + 1,
                parent_hash: header_hash(parent),
                time,
                difficulty: calc_difficulty(verifier.config(), time, parent),
                gas_limit: parent.gas_limit,
                uncle_hash: EMPTY_UNCLE_HASH,
                ..Header::default()
            });
        }
        headers
    }

    fn sequential(
        verifier: &HeaderVerifier,
        chain: &NullChain,
        headers: &[Header],
    ) -> Vec<VerifyResult> {
        headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let parent = if i == 0 {
                    chain.get_header(&header.parent_hash, header.number - 1)
                } else if header_hash(&headers[i - 1]) == header.parent_hash {
                    Some(headers[i - 1].clone())
                } else {
                    None
                };
                match parent {
                    Some(parent) => verifier.verify(header, &parent, false, false, NOW),
                    None => Err(ConsensusError::UnknownAncestor),
                }
            })
            .collect()
    }

    #[test]
    fn batch_matches_sequential_for_any_worker_count() {
        let verifier = verifier();
        let chain = Arc::new(NullChain::new());
        let genesis = genesis();
        chain.insert_header(genesis.clone());

        let mut headers = extend(&verifier, &genesis, 12);
        headers[4].difficulty += U256::from(1u8);
        headers[9].time = headers[8].time;
        let expected = sequential(&verifier, &chain, &headers);
        assert!(expected[4].is_err());
        assert!(expected[5].is_err(), "hash link broken by the tampered header");
        assert!(expected[0].is_ok());

        for workers in [1, 2, 3, 8, 32] {
            let results: Vec<_> = verify_batch(
                verifier.clone(),
                chain.clone(),
                headers.clone(),
                vec![false; headers.len()],
                NOW,
                workers,
            )
            .collect();
            assert_eq!(results, expected, "workers = {workers}");
        }
    }

    #[test]
    fn first_header_needs_known_parent() {
        let verifier = verifier();
        let chain = Arc::new(NullChain::new());
        let headers = extend(&verifier, &genesis(), 3);

        let results: Vec<_> =
            verify_batch(verifier, chain, headers, vec![false; 3], NOW, 2).collect();
        assert_eq!(results[0], Err(ConsensusError::UnknownAncestor));
        assert_eq!(results[1], Ok(()));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn empty_batch_yields_nothing() {
        let results: Vec<_> = verify_batch(
            verifier(),
            Arc::new(NullChain::new()),
            Vec::new(),
            Vec::new(),
            NOW,
            4,
        )
        .collect();
        assert!(results.is_empty());
    }

    // 64 sealed headers on two workers take 1.6s to verify in full.
    #[test]
    fn abort_mid_stream_stops_workers() {
        let (verifier, ethash) = slow_verifier();
        let chain = Arc::new(NullChain::new());
        let genesis = genesis();
        chain.insert_header(genesis.clone());
        let headers = extend(&verifier, &genesis, 64);

        let started = Instant::now();
        let mut batch = verify_batch(verifier, chain, headers, vec![true; 64], NOW, 2);
        assert_eq!(batch.next(), Some(Ok(())));
        batch.abort();
        let rest: Vec<_> = batch.by_ref().collect();
        assert!(rest.len() < 8, "{} results after abort", rest.len());
        assert!(rest.iter().all(Result::is_ok));

        assert!(wait_until(Duration::from_millis(500), || Arc::strong_count(&ethash) == 1));
        assert!(started.elapsed() < Duration::from_millis(1_000));
    }

    #[test]
    fn dropping_handle_stops_workers() {
        let (verifier, ethash) = slow_verifier();
        let chain = Arc::new(NullChain::new());
        let genesis = genesis();
        chain.insert_header(genesis.clone());
        let headers = extend(&verifier, &genesis, 64);

        let mut batch = verify_batch(verifier, chain, headers, vec![true; 64], NOW, 2);
        assert_eq!(batch.next(), Some(Ok(())));
        let abort = batch.abort_handle();
        assert!(!abort.load(Ordering::SeqCst));
        drop(batch);

        assert!(abort.load(Ordering::SeqCst));
        assert!(wait_until(Duration::from_millis(500), || Arc::strong_count(&ethash) == 1));
    }

    #[test]
    fn ready_batch_replays_results() {
        let results: Vec<_> = BatchVerification::ready(vec![Ok(()), Err(ConsensusError::FutureBlock)])
            .collect();
        assert_eq!(results, vec![Ok(()), Err(ConsensusError::FutureBlock)]);
    }

    #[test]
    fn worker_count_is_bounded_by_batch() {
        assert_eq!(worker_count(1), 1);
        assert_eq!(worker_count(0), 1);
        assert!(worker_count(1_000) >= 1);
    }
}
