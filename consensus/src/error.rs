use alloy_primitives::{B256, U256};
use thiserror::Error;

/// Why a header, seal or uncle set was rejected.
///
/// Numeric mismatches carry both the declared and the expected value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("unknown ancestor")]
    UnknownAncestor,

    #[error("block in the future")]
    FutureBlock,

    #[error("timestamp older than parent")]
    OlderBlockTime,

    #[error("extra-data too long: {have} > {max}")]
    ExtraDataTooLong { have: usize, max: u64 },

    #[error("invalid difficulty: have {have}, want {want}")]
    DifficultyMismatch { have: U256, want: U256 },

    #[error("invalid gasLimit: have {have}, max {max}")]
    GasLimitTooHigh { have: u64, max: u64 },

    #[error("invalid gasUsed: have {have}, gasLimit {limit}")]
    GasUsedExceedsLimit { have: u64, limit: u64 },

    #[error("invalid gas limit: have {have}, want {want} +-= {bound}")]
    GasLimitInvalid { have: u64, want: u64, bound: u64 },

    #[error("invalid gas limit below {min}: have {have}")]
    GasLimitBelowMinimum { have: u64, min: u64 },

    #[error("invalid baseFee before fork: have {have}, expected none")]
    BaseFeeBeforeFork { have: U256 },

    #[error("header is missing baseFee")]
    MissingBaseFee,

    #[error("invalid baseFee: have {have}, want {want}, parentBaseFee {parent_base_fee}, parentGasUsed {parent_gas_used}")]
    BaseFeeMismatch {
        have: U256,
        want: U256,
        parent_base_fee: U256,
        parent_gas_used: u64,
    },

    #[error("invalid block number: have {have}, want {want}")]
    InvalidNumber { have: u64, want: u64 },

    #[error("ethash does not support {0} fork")]
    UnsupportedFork(&'static str),

    #[error("bad DAO pro-fork extra-data")]
    BadDaoExtra,

    #[error("non-positive difficulty")]
    InvalidDifficulty,

    #[error("invalid mix digest: have {have}, want {want}")]
    InvalidMixDigest { have: B256, want: B256 },

    #[error("invalid proof-of-work")]
    InvalidPoW,

    #[error("too many uncles: {count} > {max}")]
    TooManyUncles { count: usize, max: usize },

    #[error("duplicate uncle")]
    DuplicateUncle,

    #[error("uncle is ancestor")]
    UncleIsAncestor,

    #[error("uncle's parent is not ancestor")]
    DanglingUncle,
}
