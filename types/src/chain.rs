//! Read access to the canonical chain, as needed for ancestor lookups.

use alloy_primitives::B256;

use crate::block::Block;
use crate::header::Header;

/// Looks up headers of the local chain.
///
/// Implementations must be safe to share across the batch verification
/// workers.
pub trait ChainHeaderReader: Send + Sync {
    /// The head of the local chain, if any.
    fn current_header(&self) -> Option<Header>;

    /// The header with the given hash and number.
    fn get_header(&self, hash: &B256, number: u64) -> Option<Header>;

    fn get_header_by_number(&self, number: u64) -> Option<Header>;

    fn get_header_by_hash(&self, hash: &B256) -> Option<Header>;
}

/// Extends [`ChainHeaderReader`] with full block access, needed to walk the
/// uncles of recent ancestors.
pub trait ChainReader: ChainHeaderReader {
    fn get_block(&self, hash: &B256, number: u64) -> Option<Block>;
}
