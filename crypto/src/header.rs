//! RLP encodings of a header: the full encoding (block hash) and the
//! seal encoding (PoW pre-image).

use alloy_primitives::B256;
use alloy_rlp::Encodable;
use classic_types::Header;

use crate::hash::keccak256;

/// Hash of the header with every field, identifying the block.
pub fn header_hash(header: &Header) -> B256 {
    let mut payload = Vec::with_capacity(640);
    encode_seal_fields(header, &mut payload);
    header.mix_digest.encode(&mut payload);
    header.nonce.as_bytes().encode(&mut payload);
    if let Some(base_fee) = &header.base_fee {
        base_fee.encode(&mut payload);
    }
    if let Some(withdrawals) = &header.withdrawals_hash {
        withdrawals.encode(&mut payload);
    }
    B256::from(keccak256(&wrap_list(payload)))
}

/// Hash of the header without nonce and mix digest, the input to hashimoto.
///
/// # Panics
///
/// Panics if the header carries a withdrawals hash: such a header belongs to
/// a chain this engine must never be wired to.
pub fn seal_hash(header: &Header) -> B256 {
    if header.withdrawals_hash.is_some() {
        panic!("withdrawal hash set on ethash header");
    }
    let mut payload = Vec::with_capacity(600);
    encode_seal_fields(header, &mut payload);
    if let Some(base_fee) = &header.base_fee {
        base_fee.encode(&mut payload);
    }
    B256::from(keccak256(&wrap_list(payload)))
}

fn encode_seal_fields(header: &Header, out: &mut Vec<u8>) {
    header.parent_hash.encode(out);
    header.uncle_hash.encode(out);
    header.coinbase.encode(out);
    header.root.encode(out);
    header.tx_hash.encode(out);
    header.receipt_hash.encode(out);
    header.bloom.encode(out);
    header.difficulty.encode(out);
    header.number.encode(out);
    header.gas_limit.encode(out);
    header.gas_used.encode(out);
    header.time.encode(out);
    header.extra.encode(out);
}

fn wrap_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    alloy_rlp::Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, bytes, U256};
    use classic_types::{BlockNonce, EMPTY_UNCLE_HASH};

    const EMPTY_TRIE_ROOT: B256 =
        b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

    fn mainnet_genesis() -> Header {
        Header {
            uncle_hash: EMPTY_UNCLE_HASH,
            root: b256!("d7f8974fb5ac78d9ac099b9ad5018bedc2ce0a72dad1827a1709da30580f0544"),
            tx_hash: EMPTY_TRIE_ROOT,
            receipt_hash: EMPTY_TRIE_ROOT,
            difficulty: U256::from(0x4_0000_0000u64),
            gas_limit: 5000,
            extra: bytes!("11bbe8db4e347b4e8c937c1c8370e4b5ed33adb3db69cbdb7a38e1e50b1b82fa"),
            nonce: BlockNonce::from_u64(0x42),
            ..Default::default()
        }
    }

    fn mainnet_block_one() -> Header {
        Header {
            parent_hash: b256!("d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3"),
            uncle_hash: EMPTY_UNCLE_HASH,
            coinbase: address!("05a56e2d52c817161883f50c441c3228cfe54d9f"),
            root: b256!("d67e4d450343046425ae4271474353857ab860dbc0a1dde64b41b5cd3a532bf3"),
            tx_hash: EMPTY_TRIE_ROOT,
            receipt_hash: EMPTY_TRIE_ROOT,
            difficulty: U256::from(17_171_480_576u64),
            number: 1,
            gas_limit: 5000,
            time: 1_438_269_988,
            extra: bytes!("476574682f76312e302e302f6c696e75782f676f312e342e32"),
            mix_digest: b256!("969b900de27b6ac6a67742365dd65f55a0526c41fd18e1b16f1a1215c2e66f59"),
            nonce: BlockNonce::from_u64(0x539b_d497_9fef_1ec4),
            ..Default::default()
        }
    }

    #[test]
    fn mainnet_header_hashes() {
        assert_eq!(
            header_hash(&mainnet_genesis()),
            b256!("d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3")
        );
        let block = mainnet_block_one();
        assert_eq!(block.parent_hash, header_hash(&mainnet_genesis()));
        assert_eq!(
            header_hash(&block),
            b256!("88e96d4537bea4d9c05d12549907b32561d3bf31f45aae734cdc119f13406cb6")
        );
        assert_eq!(
            seal_hash(&block),
            b256!("85913a3057ea8bec78cd916871ca73802e77724e014dda65add3405d02240eb7")
        );
    }

    fn sample() -> Header {
        Header {
            uncle_hash: EMPTY_UNCLE_HASH,
            difficulty: U256::from(131_072u64),
            number: 1,
            gas_limit: 5000,
            time: 1_438_269_988,
            extra: vec![1, 2, 3].into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_uncle_hash_is_hash_of_empty_list() {
        assert_eq!(B256::from(keccak256(&wrap_list(Vec::new()))), EMPTY_UNCLE_HASH);
    }

    #[test]
    fn seal_hash_ignores_nonce_and_mix() {
        let a = sample();
        let mut b = sample();
        b.nonce = BlockNonce::from_u64(42);
        b.mix_digest = B256::repeat_byte(7);
        assert_eq!(seal_hash(&a), seal_hash(&b));
        assert_ne!(header_hash(&a), header_hash(&b));
    }

    #[test]
    fn base_fee_is_part_of_both_hashes() {
        let a = sample();
        let mut b = sample();
        b.base_fee = Some(U256::from(1_000_000_000u64));
        assert_ne!(seal_hash(&a), seal_hash(&b));
        assert_ne!(header_hash(&a), header_hash(&b));
    }

    #[test]
    fn seal_hash_differs_from_header_hash() {
        let h = sample();
        assert_ne!(seal_hash(&h), header_hash(&h));
    }

    #[test]
    #[should_panic(expected = "withdrawal hash")]
    fn seal_hash_rejects_withdrawals() {
        let mut h = sample();
        h.withdrawals_hash = Some(B256::ZERO);
        seal_hash(&h);
    }
}
