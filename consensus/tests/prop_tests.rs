use std::sync::Arc;

use proptest::prelude::*;

use classic_consensus::{calc_difficulty, verify_batch, ConsensusError, HeaderVerifier};
use classic_crypto::header_hash;
use classic_ethash::{Ethash, EthashConfig};
use classic_nullables::NullChain;
use classic_types::{ChainConfig, ChainHeaderReader, Configurator, Header, EMPTY_UNCLE_HASH, U256};

const NOW: u64 = 1_700_000_000;

fn parent(number: u64, difficulty: u64, with_uncles: bool) -> Header {
    Header {
        number,
        time: NOW - 100_000,
        difficulty: U256::from(difficulty),
        gas_limit: 8_000_000,
        uncle_hash: if with_uncles {
            Default::default()
        } else {
            EMPTY_UNCLE_HASH
        },
        ..Header::default()
    }
}

proptest! {
    /// A shorter block time never lowers the required difficulty, and the
    /// result never drops below the floor.
    #[test]
    fn difficulty_is_monotonic_in_block_time(
        number in 0u64..20_000_000,
        difficulty in 131_072u64..u64::MAX / 2,
        with_uncles in any::<bool>(),
        dt in 1u64..2_000,
        shorter in 0u64..2_000,
    ) {
        let parent = parent(number, difficulty, with_uncles);
        let minimum = U256::from(parent_config().params().minimum_difficulty);
        for config in [ChainConfig::frontier(), ChainConfig::classic(), parent_config()] {
            let slow = calc_difficulty(&config, parent.time + dt, &parent);
            let fast = calc_difficulty(&config, parent.time + dt.saturating_sub(shorter).max(1), &parent);
            prop_assert!(fast >= slow);
            prop_assert!(slow >= minimum);
        }
    }
}

fn parent_config() -> ChainConfig {
    ChainConfig {
        eip2_block: Some(0),
        eip100b_block: Some(0),
        ..ChainConfig::frontier()
    }
}

fn chain_of(verifier: &HeaderVerifier, genesis: &Header, len: usize) -> Vec<Header> {
    let mut headers: Vec<Header> = Vec::with_capacity(len);
    for i in 0..len {
        let parent = headers.last().unwrap_or(genesis);
        let time = parent.time + 1 + (i as u64 * 7) % 30;
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

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Batch results match one-by-one verification for any worker count.
    #[test]
    fn batch_matches_sequential(
        len in 1usize..24,
        workers in 1usize..9,
        corrupt in prop::collection::vec((0usize..24, 0u8..3), 0..4),
    ) {
        let verifier = HeaderVerifier::new(
            Arc::new(parent_config()),
            Arc::new(Ethash::new(EthashConfig::test())),
        );
        let chain = Arc::new(NullChain::new());
        let genesis = parent(0, 1_000_000, false);
        chain.insert_header(genesis.clone());

        let mut headers = chain_of(&verifier, &genesis, len);
        for (index, kind) in corrupt {
            let Some(header) = headers.get_mut(index) else { continue };
            match kind {
                0 => header.difficulty += U256::from(1u8),
                1 => header.gas_used = header.gas_limit + 1,
                _ => header.number += 1,
            }
        }

        let mut expected = Vec::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let parent = if i == 0 {
                header.number.checked_sub(1).and_then(|n| chain.get_header(&header.parent_hash, n))
            } else if header_hash(&headers[i - 1]) == header.parent_hash {
                Some(headers[i - 1].clone())
            } else {
                None
            };
            expected.push(match parent {
                Some(parent) => verifier.verify(header, &parent, false, false, NOW),
                None => Err(ConsensusError::UnknownAncestor),
            });
        }

        let results: Vec<_> = verify_batch(
            verifier.clone(),
            chain.clone(),
            headers.clone(),
            vec![false; headers.len()],
            NOW,
            workers,
        )
        .collect();
        prop_assert_eq!(results, expected);
    }
}
