//! Single-header verification against a known parent.

use std::sync::Arc;

use classic_ethash::Ethash;
use classic_types::params::{ALLOWED_FUTURE_BLOCK_TIME, MAX_GAS_LIMIT};
use classic_types::{Configurator, Fork, Header};

use crate::dao::verify_dao_extra;
use crate::difficulty::calc_difficulty;
use crate::gas::{verify_eip1559_header, verify_gas_limit};
use crate::seal::verify_seal;
use crate::ConsensusError;

/// Checks a header against its parent under a chain's fork rules.
///
/// Cloning is cheap; batch workers each hold a clone.
#[derive(Clone)]
pub struct HeaderVerifier {
    config: Arc<dyn Configurator>,
    ethash: Arc<Ethash>,
}

impl HeaderVerifier {
    pub fn new(config: Arc<dyn Configurator>, ethash: Arc<Ethash>) -> Self {
        Self { config, ethash }
    }

    pub fn config(&self) -> &dyn Configurator {
        self.config.as_ref()
    }

    pub fn ethash(&self) -> &Ethash {
        &self.ethash
    }

    /// Verify `header` as a child of `parent` at wall-clock time `now`.
    ///
    /// Uncles skip the future-timestamp check. The seal is only checked when
    /// `seal` is set.
    pub fn verify(
        &self,
        header: &Header,
        parent: &Header,
        uncle: bool,
        seal: bool,
        now: u64,
    ) -> Result<(), ConsensusError> {
        let config = self.config();
        let params = config.params();

        if header.extra.len() as u64 > params.maximum_extra_data_size {
            return Err(ConsensusError::ExtraDataTooLong {
                have: header.extra.len(),
                max: params.maximum_extra_data_size,
            });
        }

        if !uncle && header.time > now.saturating_add(ALLOWED_FUTURE_BLOCK_TIME) {
            return Err(ConsensusError::FutureBlock);
        }
        if header.time <= parent.time {
            return Err(ConsensusError::OlderBlockTime);
        }

        let want = calc_difficulty(config, header.time, parent);
        if want != header.difficulty {
            return Err(ConsensusError::DifficultyMismatch {
                have: header.difficulty,
                want,
            });
        }

        if header.gas_limit > MAX_GAS_LIMIT {
            return Err(ConsensusError::GasLimitTooHigh {
                have: header.gas_limit,
                max: MAX_GAS_LIMIT,
            });
        }
        if header.gas_used > header.gas_limit {
            return Err(ConsensusError::GasUsedExceedsLimit {
                have: header.gas_used,
                limit: header.gas_limit,
            });
        }

        if config.is_fork_active_at_block(Fork::Eip1559, header.number) {
            verify_eip1559_header(config, parent, header)?;
        } else {
            if let Some(have) = header.base_fee {
                return Err(ConsensusError::BaseFeeBeforeFork { have });
            }
            verify_gas_limit(params, parent.gas_limit, header.gas_limit)?;
        }

        let want = parent.number.saturating_add(1);
        if header.number != want {
            return Err(ConsensusError::InvalidNumber {
                have: header.number,
                want,
            });
        }

        if config.is_fork_active_at_time(Fork::Eip3860, header.time)
            || config.is_fork_active_at_block(Fork::Eip3860, header.number)
        {
            return Err(ConsensusError::UnsupportedFork("shanghai"));
        }
        if config.is_fork_active_at_time(Fork::Eip4844, header.time) {
            return Err(ConsensusError::UnsupportedFork("cancun"));
        }

        if seal {
            verify_seal(&self.ethash, header, false)?;
        }

        verify_dao_extra(config, header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use classic_ethash::EthashConfig;
    use classic_types::{Bytes, ChainConfig, EMPTY_UNCLE_HASH};

    const NOW: u64 = 1_700_000_000;

    fn verifier(config: ChainConfig) -> HeaderVerifier {
        HeaderVerifier::new(Arc::new(config), Arc::new(Ethash::new(EthashConfig::test())))
    }

    fn parent() -> Header {
        Header {
            number: 100,
            time: NOW - 100,
            difficulty: U256::from(1_000_000u64),
            gas_limit: 8_000_000,
            uncle_hash: EMPTY_UNCLE_HASH,
            ..Header::default()
        }
    }

    fn child(verifier: &HeaderVerifier, parent: &Header) -> Header {
        let time = parent.time + 13;
        Header {
            number: parent.number + 1,
            time,
            difficulty: calc_difficulty(verifier.config(), time, parent),
            gas_limit: parent.gas_limit,
            uncle_hash: EMPTY_UNCLE_HASH,
            ..Header::default()
        }
    }

    fn config() -> ChainConfig {
        ChainConfig {
            eip2_block: Some(0),
            eip100b_block: Some(0),
            ecip1041_block: Some(0),
            ..ChainConfig::frontier()
        }
    }

    #[test]
    fn well_formed_child_passes() {
        let verifier = verifier(config());
        let parent = parent();
        let header = child(&verifier, &parent);
        assert_eq!(verifier.verify(&header, &parent, false, false, NOW), Ok(()));
    }

    #[test]
    fn long_extra_data_fails() {
        let verifier = verifier(config());
        let parent = parent();
        let mut header = child(&verifier, &parent);
        header.extra = Bytes::from(vec![0u8; 33]);
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::ExtraDataTooLong { have: 33, max: 32 })
        );
    }

    #[test]
    fn future_block_fails_unless_uncle() {
        let verifier = verifier(config());
        let parent = parent();
        let mut header = child(&verifier, &parent);
        header.time = NOW + 16;
        header.difficulty = calc_difficulty(verifier.config(), header.time, &parent);
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::FutureBlock)
        );
        assert_eq!(verifier.verify(&header, &parent, true, false, NOW), Ok(()));

        header.time = NOW + 15;
        header.difficulty = calc_difficulty(verifier.config(), header.time, &parent);
        assert_eq!(verifier.verify(&header, &parent, false, false, NOW), Ok(()));
    }

    #[test]
    fn timestamp_must_increase() {
        let verifier = verifier(config());
        let parent = parent();
        let mut header = child(&verifier, &parent);
        header.time = parent.time;
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::OlderBlockTime)
        );
    }

    #[test]
    fn wrong_difficulty_reports_both_values() {
        let verifier = verifier(config());
        let parent = parent();
        let mut header = child(&verifier, &parent);
        let want = header.difficulty;
        header.difficulty += U256::from(1u8);
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::DifficultyMismatch {
                have: want + U256::from(1u8),
                want
            })
        );
    }

    #[test]
    fn gas_checks() {
        let verifier = verifier(config());
        let parent = parent();

        let mut header = child(&verifier, &parent);
        header.gas_used = header.gas_limit + 1;
        assert!(matches!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::GasUsedExceedsLimit { .. })
        ));

        let mut header = child(&verifier, &parent);
        header.gas_limit = MAX_GAS_LIMIT + 1;
        assert!(matches!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::GasLimitTooHigh { .. })
        ));

        let mut header = child(&verifier, &parent);
        header.gas_limit = parent.gas_limit * 2;
        assert!(matches!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::GasLimitInvalid { .. })
        ));
    }

    #[test]
    fn base_fee_before_fork_fails() {
        let verifier = verifier(config());
        let parent = parent();
        let mut header = child(&verifier, &parent);
        header.base_fee = Some(U256::from(7u8));
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::BaseFeeBeforeFork {
                have: U256::from(7u8)
            })
        );
    }

    #[test]
    fn number_must_follow_parent() {
        let verifier = verifier(config());
        let parent = parent();
        let mut header = child(&verifier, &parent);
        header.number += 1;
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::InvalidNumber { have: 102, want: 101 })
        );
    }

    #[test]
    fn unsupported_forks_are_rejected() {
        let verifier = verifier(ChainConfig {
            eip3860_time: Some(0),
            ..config()
        });
        let parent = parent();
        let header = child(&verifier, &parent);
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::UnsupportedFork("shanghai"))
        );

        let verifier = self::verifier(ChainConfig {
            eip4844_time: Some(0),
            ..config()
        });
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::UnsupportedFork("cancun"))
        );
    }

    #[test]
    fn dao_window_is_enforced() {
        let verifier = verifier(ChainConfig {
            dao_fork_block: Some(101),
            ..config()
        });
        let parent = parent();
        let mut header = child(&verifier, &parent);
        assert_eq!(
            verifier.verify(&header, &parent, false, false, NOW),
            Err(ConsensusError::BadDaoExtra)
        );
        header.extra = Bytes::from_static(b"dao-hard-fork");
        assert_eq!(verifier.verify(&header, &parent, false, false, NOW), Ok(()));
    }

    #[test]
    fn seal_is_checked_when_requested() {
        let verifier = verifier(config());
        let parent = parent();
        let header = child(&verifier, &parent);
        assert!(matches!(
            verifier.verify(&header, &parent, false, true, NOW),
            Err(ConsensusError::InvalidMixDigest { .. })
        ));
    }
}
