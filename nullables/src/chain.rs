//! Nullable chain: an in-memory header and block reader.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use classic_crypto::header_hash;
use classic_types::{Block, ChainHeaderReader, ChainReader, Header, B256};

/// An in-memory chain for testing.
///
/// Headers are keyed by their hash; the most recently inserted header at a
/// height becomes canonical for that height.
#[derive(Default)]
pub struct NullChain {
    headers: RwLock<HashMap<B256, Header>>,
    blocks: RwLock<HashMap<B256, Block>>,
    canonical: RwLock<BTreeMap<u64, B256>>,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a header and return its hash.
    pub fn insert_header(&self, header: Header) -> B256 {
        let hash = header_hash(&header);
        self.canonical.write().insert(header.number, hash);
        self.headers.write().insert(hash, header);
        hash
    }

    /// Store a block (and its header) and return its hash.
    pub fn insert_block(&self, block: Block) -> B256 {
        let hash = self.insert_header(block.header.clone());
        self.blocks.write().insert(hash, block);
        hash
    }

    pub fn len(&self) -> usize {
        self.headers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChainHeaderReader for NullChain {
    fn current_header(&self) -> Option<Header> {
        let canonical = self.canonical.read();
        let (_, hash) = canonical.last_key_value()?;
        self.headers.read().get(hash).cloned()
    }

    fn get_header(&self, hash: &B256, number: u64) -> Option<Header> {
        self.headers
            .read()
            .get(hash)
            .filter(|header| header.number == number)
            .cloned()
    }

    fn get_header_by_number(&self, number: u64) -> Option<Header> {
        let hash = *self.canonical.read().get(&number)?;
        self.headers.read().get(&hash).cloned()
    }

    fn get_header_by_hash(&self, hash: &B256) -> Option<Header> {
        self.headers.read().get(hash).cloned()
    }
}

impl ChainReader for NullChain {
    fn get_block(&self, hash: &B256, number: u64) -> Option<Block> {
        self.blocks
            .read()
            .get(hash)
            .filter(|block| block.number() == number)
            .cloned()
    }
}
