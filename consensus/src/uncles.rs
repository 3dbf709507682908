//! Uncle inclusion rules.

use std::collections::{HashMap, HashSet};

use classic_crypto::header_hash;
use classic_ethash::PowMode;
use classic_types::params::{MAX_UNCLES, UNCLE_GENERATIONS};
use classic_types::{Block, ChainReader, Header, B256};

use crate::verifier::HeaderVerifier;
use crate::ConsensusError;

/// Verify the uncles included in `block`.
///
/// An uncle must descend from one of the block's last seven ancestors, must
/// not be an ancestor itself, and must not have been included before within
/// that window. Each uncle header is then verified against its own parent
/// with the seal checked.
pub fn verify_uncles(
    verifier: &HeaderVerifier,
    chain: &dyn ChainReader,
    block: &Block,
    now: u64,
) -> Result<(), ConsensusError> {
    if verifier.ethash().config().pow_mode == PowMode::FullFake {
        return Ok(());
    }
    let count = block.uncles().len();
    if count > MAX_UNCLES {
        return Err(ConsensusError::TooManyUncles {
            count,
            max: MAX_UNCLES,
        });
    }
    if count == 0 {
        return Ok(());
    }

    let mut uncles: HashSet<B256> = HashSet::new();
    let mut ancestors: HashMap<B256, Header> = HashMap::new();

    let mut parent = block.header.parent_hash;
    let mut number = block.number().checked_sub(1);
    for _ in 0..UNCLE_GENERATIONS {
        let Some(height) = number else {
            break;
        };
        let Some(ancestor) = chain.get_header(&parent, height) else {
            break;
        };
        if !ancestor.has_empty_uncles() {
            let Some(included) = chain.get_block(&parent, height) else {
                break;
            };
            uncles.extend(included.uncles().iter().map(header_hash));
        }
        let next = ancestor.parent_hash;
        ancestors.insert(parent, ancestor);
        parent = next;
        number = height.checked_sub(1);
    }

    let hash = header_hash(&block.header);
    ancestors.insert(hash, block.header.clone());
    uncles.insert(hash);

    for uncle in block.uncles() {
        let hash = header_hash(uncle);
        if !uncles.insert(hash) {
            return Err(ConsensusError::DuplicateUncle);
        }
        if ancestors.contains_key(&hash) {
            return Err(ConsensusError::UncleIsAncestor);
        }
        let uncle_parent = match ancestors.get(&uncle.parent_hash) {
            Some(parent) if uncle.parent_hash != block.header.parent_hash => parent,
            _ => return Err(ConsensusError::DanglingUncle),
        };
        verifier.verify(uncle, uncle_parent, true, true, now)?;
    }
    Ok(())
}
