//! Proof-of-work seal verification.

use std::thread;
use std::time::Duration;

use alloy_primitives::{B256, U256, U512};
use tracing::trace;

use classic_crypto::seal_hash;
use classic_ethash::Ethash;
use classic_types::Header;

use crate::ConsensusError;

/// Check that `header`'s mix digest and nonce satisfy its difficulty.
///
/// With `full_dag` the resident dataset is used when it is already
/// generated; otherwise the epoch's verification cache is used. Both paths
/// produce identical results.
pub fn verify_seal(ethash: &Ethash, header: &Header, full_dag: bool) -> Result<(), ConsensusError> {
    let config = ethash.config();
    if config.pow_mode.is_fake() {
        if config.fake_delay_ms > 0 {
            thread::sleep(Duration::from_millis(config.fake_delay_ms));
        }
        if config.fake_fail == Some(header.number) {
            return Err(ConsensusError::InvalidPoW);
        }
        return Ok(());
    }

    if header.difficulty.is_zero() {
        return Err(ConsensusError::InvalidDifficulty);
    }

    let hash = seal_hash(header).0;
    let nonce = header.nonce.as_u64();

    let full = if full_dag {
        ethash.hashimoto_full(header.number, &hash, nonce)
    } else {
        None
    };
    let output = match full {
        Some(output) => output,
        None => {
            if full_dag {
                trace!(number = header.number, "Dataset not ready, verifying seal against cache");
            }
            ethash.hashimoto_light(header.number, &hash, nonce)
        }
    };

    let digest = B256::from(output.digest);
    if header.mix_digest != digest {
        return Err(ConsensusError::InvalidMixDigest {
            have: header.mix_digest,
            want: digest,
        });
    }
    if !meets_target(&output.result, header.difficulty) {
        return Err(ConsensusError::InvalidPoW);
    }
    Ok(())
}

/// Whether `result`, read big-endian, is at most `2^256 / difficulty`.
pub fn meets_target(result: &[u8; 32], difficulty: U256) -> bool {
    if difficulty.is_zero() {
        return false;
    }
    let divisor = U512::from_be_slice(&difficulty.to_be_bytes::<32>());
    let target = (U512::from(1u8) << 256usize) / divisor;
    U512::from_be_slice(result) <= target
}
