//! The Ethash hashing core: epoch arithmetic, cache and dataset generation,
//! and the hashimoto mixing function.
//!
//! Buffers are slices of native-endian `u32` words. Every hash input and
//! output is interpreted little-endian, so results are identical on any host.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use classic_crypto::{keccak256, Keccak512Hasher};
use classic_utils::format_duration;

/// Revision of the algorithm, baked into dump file names.
pub const ALGORITHM_REVISION: u32 = 23;

pub const DATASET_INIT_BYTES: u64 = 1 << 30;
pub const DATASET_GROWTH_BYTES: u64 = 1 << 23;
pub const CACHE_INIT_BYTES: u64 = 1 << 24;
pub const CACHE_GROWTH_BYTES: u64 = 1 << 17;

/// Blocks per epoch before ECIP-1099.
pub const EPOCH_LENGTH_DEFAULT: u64 = 30_000;
/// Blocks per epoch from ECIP-1099 onwards.
pub const EPOCH_LENGTH_ECIP1099: u64 = 60_000;

/// Width of the mix, in bytes.
pub const MIX_BYTES: usize = 128;
/// Width of a cache or dataset row, in bytes.
pub const HASH_BYTES: usize = 64;
/// Width of a cache or dataset row, in words.
pub const HASH_WORDS: usize = 16;
const MIX_WORDS: usize = MIX_BYTES / 4;

pub const DATASET_PARENTS: u32 = 256;
pub const CACHE_ROUNDS: usize = 3;
pub const LOOP_ACCESSES: usize = 64;

/// No future item is pre-generated past this epoch.
pub const MAX_EPOCH: u64 = 2048;

/// Cache and dataset sizes used by the test PoW mode.
pub const TEST_CACHE_BYTES: u64 = 1024;
pub const TEST_DATASET_BYTES: u64 = 32 * 1024;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

/// Output of a hashimoto evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowOutput {
    /// Compressed mix, compared against the header's mix digest.
    pub digest: [u8; 32],
    /// Final hash, compared against the difficulty target.
    pub result: [u8; 32],
}

// ---------------------------------------------------------------------------
// Epoch arithmetic
// ---------------------------------------------------------------------------

/// Epoch length in force at `block`.
pub fn calc_epoch_length(block: u64, ecip1099_block: Option<u64>) -> u64 {
    match ecip1099_block {
        Some(activation) if block >= activation => EPOCH_LENGTH_ECIP1099,
        _ => EPOCH_LENGTH_DEFAULT,
    }
}

pub fn calc_epoch(block: u64, epoch_length: u64) -> u64 {
    block / epoch_length
}

/// A block number inside `epoch`, used to derive its seed.
pub fn calc_epoch_block(epoch: u64, epoch_length: u64) -> u64 {
    epoch * epoch_length + 1
}

/// Seed of an epoch: Keccak-256 iterated once per legacy-length epoch elapsed
/// at the epoch's first block.
pub fn seed_hash(epoch: u64, epoch_length: u64) -> [u8; 32] {
    let block = calc_epoch_block(epoch, epoch_length);
    let mut seed = [0u8; 32];
    for _ in 0..block / EPOCH_LENGTH_DEFAULT {
        seed = keccak256(&seed);
    }
    seed
}

/// Size in bytes of the verification cache for `epoch`.
pub fn cache_size(epoch: u64) -> u64 {
    let row = HASH_BYTES as u64;
    let mut size = CACHE_INIT_BYTES + CACHE_GROWTH_BYTES * epoch - row;
    while !is_prime(size / row) {
        size -= 2 * row;
    }
    size
}

/// Size in bytes of the full dataset for `epoch`.
pub fn dataset_size(epoch: u64) -> u64 {
    let row = MIX_BYTES as u64;
    let mut size = DATASET_INIT_BYTES + DATASET_GROWTH_BYTES * epoch - row;
    while !is_prime(size / row) {
        size -= 2 * row;
    }
    size
}

/// Deterministic trial division; row counts stay well below 2^32.
fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

// ---------------------------------------------------------------------------
// Mixing primitives
// ---------------------------------------------------------------------------

/// The non-associative FNV-1 variant Ethash uses in place of XOR.
#[inline]
pub fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(0x0100_0193) ^ b
}

#[inline]
fn fnv_hash(mix: &mut [u32], data: &[u32]) {
    for (m, d) in mix.iter_mut().zip(data) {
        *m = fnv(*m, *d);
    }
}

#[inline]
fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

// ---------------------------------------------------------------------------
// Cache generation
// ---------------------------------------------------------------------------

/// Fill `dest` with the verification cache for an epoch.
///
/// Rows are seeded sequentially by re-hashing the previous row, then mixed
/// with [`CACHE_ROUNDS`] passes of Sergio Demian Lerner's RandMemoHash.
pub fn generate_cache(dest: &mut [u32], epoch: u64, epoch_length: u64, seed: &[u8; 32]) {
    let start = Instant::now();
    let mut last_report = start;

    {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(dest);
        let size = bytes.len();
        let rows = size / HASH_BYTES;
        let total = (rows * (CACHE_ROUNDS + 1)) as u64;
        let mut progress = 0u64;
        let mut hasher = Keccak512Hasher::new();

        let mut report = |progress: u64| {
            if last_report.elapsed() >= PROGRESS_INTERVAL {
                info!(
                    epoch,
                    epoch_length,
                    percentage = progress * 100 / total,
                    elapsed = %format_duration(start.elapsed()),
                    "Generating ethash verification cache"
                );
                last_report = Instant::now();
            }
        };

        hasher.hash_into(seed, &mut bytes[..HASH_BYTES]);
        for offset in (HASH_BYTES..size).step_by(HASH_BYTES) {
            let (done, rest) = bytes.split_at_mut(offset);
            hasher.hash_into(&done[offset - HASH_BYTES..], &mut rest[..HASH_BYTES]);
            progress += 1;
            report(progress);
        }

        let mut temp = [0u8; HASH_BYTES];
        for _ in 0..CACHE_ROUNDS {
            for j in 0..rows {
                let src = ((j + rows - 1) % rows) * HASH_BYTES;
                let dst = j * HASH_BYTES;
                let xor = (le_u32(&bytes[dst..]) as usize % rows) * HASH_BYTES;
                for k in 0..HASH_BYTES {
                    temp[k] = bytes[src + k] ^ bytes[xor + k];
                }
                hasher.hash_into(&temp, &mut bytes[dst..dst + HASH_BYTES]);
                progress += 1;
                report(progress);
            }
        }
    }

    // The rows were written as little-endian words.
    for word in dest.iter_mut() {
        *word = u32::from_le(*word);
    }

    let elapsed = start.elapsed();
    if elapsed > PROGRESS_INTERVAL {
        info!(epoch, epoch_length, elapsed = %format_duration(elapsed), "Generated ethash verification cache");
    } else {
        debug!(epoch, epoch_length, elapsed = %format_duration(elapsed), "Generated ethash verification cache");
    }
}

// ---------------------------------------------------------------------------
// Dataset generation
// ---------------------------------------------------------------------------

/// Derive dataset row `index` from the cache.
pub fn generate_dataset_item(
    cache: &[u32],
    index: u32,
    hasher: &mut Keccak512Hasher,
) -> [u8; HASH_BYTES] {
    let rows = (cache.len() / HASH_WORDS) as u32;
    let base = ((index % rows) as usize) * HASH_WORDS;

    let mut mix = [0u8; HASH_BYTES];
    for (i, chunk) in mix.chunks_exact_mut(4).enumerate() {
        let word = if i == 0 {
            cache[base] ^ index
        } else {
            cache[base + i]
        };
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    let seeded = hasher.hash(&mix);

    let mut int_mix = [0u32; HASH_WORDS];
    for (i, word) in int_mix.iter_mut().enumerate() {
        *word = le_u32(&seeded[i * 4..]);
    }
    for i in 0..DATASET_PARENTS {
        let parent = (fnv(index ^ i, int_mix[i as usize % HASH_WORDS]) % rows) as usize;
        fnv_hash(&mut int_mix, &cache[parent * HASH_WORDS..(parent + 1) * HASH_WORDS]);
    }

    for (chunk, word) in mix.chunks_exact_mut(4).zip(int_mix) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    hasher.hash(&mix)
}

/// Fill `dest` with the full dataset derived from `cache`, in parallel.
pub fn generate_dataset(dest: &mut [u32], epoch: u64, epoch_length: u64, cache: &[u32]) {
    let start = Instant::now();
    let rows = (dest.len() / HASH_WORDS) as u64;
    let percent = (rows / 100).max(1);
    let progress = AtomicU64::new(0);

    dest.par_chunks_mut(HASH_WORDS)
        .enumerate()
        .for_each_init(Keccak512Hasher::new, |hasher, (index, row)| {
            let item = generate_dataset_item(cache, index as u32, hasher);
            for (word, bytes) in row.iter_mut().zip(item.chunks_exact(4)) {
                *word = le_u32(bytes);
            }
            let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
            if done % percent == 0 {
                info!(
                    epoch,
                    epoch_length,
                    percentage = done * 100 / rows,
                    elapsed = %format_duration(start.elapsed()),
                    "Generating DAG in progress"
                );
            }
        });

    info!(epoch, epoch_length, elapsed = %format_duration(start.elapsed()), "Generated ethash dataset");
}

// ---------------------------------------------------------------------------
// Hashimoto
// ---------------------------------------------------------------------------

/// Aggregate dataset rows selected by `hash` and `nonce` into a digest.
///
/// `lookup(i)` returns dataset row `i` as sixteen words; `size` is the
/// dataset size in bytes.
pub fn hashimoto<F>(hash: &[u8; 32], nonce: u64, size: u64, mut lookup: F) -> PowOutput
where
    F: FnMut(u32) -> [u32; HASH_WORDS],
{
    let rows = (size / MIX_BYTES as u64) as u32;

    let mut input = [0u8; 40];
    input[..32].copy_from_slice(hash);
    input[32..].copy_from_slice(&nonce.to_le_bytes());
    let seed = classic_crypto::keccak512(&input);
    let seed_head = le_u32(&seed);

    let mut mix = [0u32; MIX_WORDS];
    for (i, word) in mix.iter_mut().enumerate() {
        *word = le_u32(&seed[(i % HASH_WORDS) * 4..]);
    }

    let mut temp = [0u32; MIX_WORDS];
    for i in 0..LOOP_ACCESSES {
        let parent = fnv(i as u32 ^ seed_head, mix[i % MIX_WORDS]) % rows;
        for j in 0..(MIX_BYTES / HASH_BYTES) {
            let row = lookup(2 * parent + j as u32);
            temp[j * HASH_WORDS..(j + 1) * HASH_WORDS].copy_from_slice(&row);
        }
        fnv_hash(&mut mix, &temp);
    }

    let mut digest = [0u8; 32];
    for (i, chunk) in digest.chunks_exact_mut(4).enumerate() {
        let m = &mix[i * 4..i * 4 + 4];
        chunk.copy_from_slice(&fnv(fnv(fnv(m[0], m[1]), m[2]), m[3]).to_le_bytes());
    }

    let mut tail = [0u8; HASH_BYTES + 32];
    tail[..HASH_BYTES].copy_from_slice(&seed);
    tail[HASH_BYTES..].copy_from_slice(&digest);
    PowOutput {
        digest,
        result: keccak256(&tail),
    }
}

/// Hashimoto over a cache, regenerating each dataset row on demand.
pub fn hashimoto_light(size: u64, cache: &[u32], hash: &[u8; 32], nonce: u64) -> PowOutput {
    let mut hasher = Keccak512Hasher::new();
    hashimoto(hash, nonce, size, |index| {
        let raw = generate_dataset_item(cache, index, &mut hasher);
        let mut row = [0u32; HASH_WORDS];
        for (word, bytes) in row.iter_mut().zip(raw.chunks_exact(4)) {
            *word = le_u32(bytes);
        }
        row
    })
}

/// Hashimoto over a resident dataset.
pub fn hashimoto_full(dataset: &[u32], hash: &[u8; 32], nonce: u64) -> PowOutput {
    let size = (dataset.len() * 4) as u64;
    hashimoto(hash, nonce, size, |index| {
        let offset = index as usize * HASH_WORDS;
        let mut row = [0u32; HASH_WORDS];
        row.copy_from_slice(&dataset[offset..offset + HASH_WORDS]);
        row
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache(epoch: u64) -> Vec<u32> {
        let mut cache = vec![0u32; TEST_CACHE_BYTES as usize / 4];
        generate_cache(&mut cache, epoch, EPOCH_LENGTH_DEFAULT, &seed_hash(epoch, EPOCH_LENGTH_DEFAULT));
        cache
    }

    #[test]
    fn epoch_zero_sizes() {
        assert_eq!(cache_size(0), 16_776_896);
        assert_eq!(dataset_size(0), 1_073_739_904);
    }

    #[test]
    fn epoch_one_sizes() {
        assert_eq!(cache_size(1), 16_907_456);
        assert_eq!(dataset_size(1), 1_082_130_304);
    }

    #[test]
    fn sizes_have_prime_row_counts() {
        for epoch in [0u64, 7, 100, 390] {
            assert!(is_prime(cache_size(epoch) / HASH_BYTES as u64));
            assert!(is_prime(dataset_size(epoch) / MIX_BYTES as u64));
        }
    }

    #[test]
    fn primality() {
        let primes: Vec<u64> = (0..30).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime(262_139));
        assert!(!is_prime(262_143));
    }

    #[test]
    fn epoch_length_switches_at_ecip1099() {
        assert_eq!(calc_epoch_length(11_699_999, Some(11_700_000)), EPOCH_LENGTH_DEFAULT);
        assert_eq!(calc_epoch_length(11_700_000, Some(11_700_000)), EPOCH_LENGTH_ECIP1099);
        assert_eq!(calc_epoch_length(u64::MAX, None), EPOCH_LENGTH_DEFAULT);
        assert_eq!(calc_epoch(11_700_000, EPOCH_LENGTH_ECIP1099), 195);
        assert_eq!(calc_epoch(11_699_999, EPOCH_LENGTH_DEFAULT), 389);
    }

    #[test]
    fn seed_hash_counts_legacy_epochs() {
        assert_eq!(seed_hash(0, EPOCH_LENGTH_DEFAULT), [0u8; 32]);
        assert_eq!(seed_hash(1, EPOCH_LENGTH_DEFAULT), keccak256(&[0u8; 32]));
        // One ECIP-1099 epoch spans two legacy epochs.
        assert_eq!(
            seed_hash(1, EPOCH_LENGTH_ECIP1099),
            seed_hash(2, EPOCH_LENGTH_DEFAULT)
        );
        assert_eq!(
            seed_hash(195, EPOCH_LENGTH_ECIP1099),
            seed_hash(390, EPOCH_LENGTH_DEFAULT)
        );
    }

    #[test]
    fn fnv_wraps() {
        assert_eq!(fnv(0, 5), 5);
        assert_eq!(fnv(1, 0), 0x0100_0193);
        assert_eq!(fnv(u32::MAX, 0), u32::MAX.wrapping_mul(0x0100_0193));
    }

    #[test]
    fn cache_generation_is_deterministic() {
        let a = test_cache(0);
        let b = test_cache(0);
        assert_eq!(a, b);
        assert!(a.iter().any(|&w| w != 0));
        assert_ne!(a, test_cache(1));
    }

    #[test]
    fn light_and_full_agree() {
        let cache = test_cache(0);
        let mut dataset = vec![0u32; TEST_DATASET_BYTES as usize / 4];
        generate_dataset(&mut dataset, 0, EPOCH_LENGTH_DEFAULT, &cache);

        let hash = [0x5au8; 32];
        for nonce in [0u64, 1, 0xdead_beef, u64::MAX] {
            let light = hashimoto_light(TEST_DATASET_BYTES, &cache, &hash, nonce);
            let full = hashimoto_full(&dataset, &hash, nonce);
            assert_eq!(light, full, "nonce {nonce}");
        }
    }

    fn h256(s: &str) -> [u8; 32] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    // Reference vector shared with other Ethash implementations: a 1 KiB
    // epoch 0 cache and its 32 KiB dataset.
    #[test]
    fn known_answer_for_small_epoch_zero_buffers() {
        let cache = test_cache(0);
        let mut dataset = vec![0u32; TEST_DATASET_BYTES as usize / 4];
        generate_dataset(&mut dataset, 0, EPOCH_LENGTH_DEFAULT, &cache);

        let hash = h256("c9149cc0386e689d789a1c2f3d5d169a61a6218ed30e74414dc736e442ef3d1f");
        let want = PowOutput {
            digest: h256("e4073cffaef931d37117cefd9afd27ea0f1cad6a981dd2605c4a1ac97c519800"),
            result: h256("d3539235ee2e6f8db665c0a72169f55b7f6c605712330b778ec3944f0eb5a557"),
        };
        assert_eq!(hashimoto_light(TEST_DATASET_BYTES, &cache, &hash, 0), want);
        assert_eq!(hashimoto_full(&dataset, &hash, 0), want);
    }

    #[test]
    fn dataset_rows_match_item_derivation() {
        let cache = test_cache(0);
        let mut dataset = vec![0u32; TEST_DATASET_BYTES as usize / 4];
        generate_dataset(&mut dataset, 0, EPOCH_LENGTH_DEFAULT, &cache);

        let mut hasher = Keccak512Hasher::new();
        let item = generate_dataset_item(&cache, 3, &mut hasher);
        for (i, word) in dataset[3 * HASH_WORDS..4 * HASH_WORDS].iter().enumerate() {
            assert_eq!(*word, le_u32(&item[i * 4..]));
        }
    }

    #[test]
    fn nonce_changes_output() {
        let cache = test_cache(0);
        let hash = [1u8; 32];
        let a = hashimoto_light(TEST_DATASET_BYTES, &cache, &hash, 1);
        let b = hashimoto_light(TEST_DATASET_BYTES, &cache, &hash, 2);
        assert_ne!(a.digest, b.digest);
        assert_ne!(a.result, b.result);
    }
}
