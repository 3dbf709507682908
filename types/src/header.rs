//! Block header as consumed by the engine.

use alloy_primitives::{b256, Address, Bloom, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keccak-256 of the RLP encoding of an empty list: the uncle hash of a block
/// without uncles.
pub const EMPTY_UNCLE_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// The 64-bit PoW nonce, stored big-endian as it appears on the wire.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockNonce([u8; 8]);

impl BlockNonce {
    pub const ZERO: Self = Self([0u8; 8]);

    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn from_u64(nonce: u64) -> Self {
        Self(nonce.to_be_bytes())
    }

    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Debug for BlockNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockNonce({:#018x})", self.as_u64())
    }
}

impl fmt::Display for BlockNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.as_u64())
    }
}

/// A block header.
///
/// The engine never mutates a header it verifies. Only the engine's `prepare`
/// step writes a difficulty, into a header that is still being assembled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_hash: B256,
    pub uncle_hash: B256,
    pub coinbase: Address,
    pub root: B256,
    pub tx_hash: B256,
    pub receipt_hash: B256,
    pub bloom: Bloom,
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub time: u64,
    pub extra: Bytes,
    pub mix_digest: B256,
    pub nonce: BlockNonce,

    /// Present only from EIP-1559 onwards.
    #[serde(default)]
    pub base_fee: Option<U256>,

    /// Never valid on a PoW chain; carried so that misconfiguration is caught.
    #[serde(default)]
    pub withdrawals_hash: Option<B256>,
}

impl Header {
    /// Whether this header commits to an empty uncle list.
    pub fn has_empty_uncles(&self) -> bool {
        self.uncle_hash == EMPTY_UNCLE_HASH
    }
}
