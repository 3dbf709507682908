//! Protocol parameters consumed by the difficulty and header rules.
//!
//! Every value here is consensus-critical: changing any of them forks the node
//! off the chain it is configured for.

use serde::{Deserialize, Serialize};

/// Tunable protocol parameters stored alongside the fork schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    // ── Difficulty ───────────────────────────────────────────────────────
    /// Floor below which difficulty never drops.
    #[serde(default = "default_minimum_difficulty")]
    pub minimum_difficulty: u64,

    /// Divisor of the parent difficulty used as the adjustment quantum.
    #[serde(default = "default_difficulty_bound_divisor")]
    pub difficulty_bound_divisor: u64,

    /// Frontier: block times below this many seconds raise difficulty.
    #[serde(default = "default_duration_limit")]
    pub duration_limit: u64,

    // ── Header ───────────────────────────────────────────────────────────
    #[serde(default = "default_maximum_extra_data_size")]
    pub maximum_extra_data_size: u64,

    #[serde(default = "default_gas_limit_bound_divisor")]
    pub gas_limit_bound_divisor: u64,

    #[serde(default = "default_min_gas_limit")]
    pub min_gas_limit: u64,

    // ── EIP-1559 ─────────────────────────────────────────────────────────
    #[serde(default = "default_elasticity_multiplier")]
    pub elasticity_multiplier: u64,

    #[serde(default = "default_base_fee_change_denominator")]
    pub base_fee_change_denominator: u64,

    /// Base fee of the first block after EIP-1559 activates (wei).
    #[serde(default = "default_initial_base_fee")]
    pub initial_base_fee: u64,
}

/// Upper bound on a header's gas limit (2^63 - 1).
pub const MAX_GAS_LIMIT: u64 = 0x7fff_ffff_ffff_ffff;

/// Seconds a header's timestamp may run ahead of the local clock.
pub const ALLOWED_FUTURE_BLOCK_TIME: u64 = 15;

/// Maximum number of uncles a block may include.
pub const MAX_UNCLES: usize = 2;

/// Number of generations an uncle may trail the block including it.
pub const UNCLE_GENERATIONS: u64 = 7;

/// Blocks from the DAO fork block that must carry [`DAO_FORK_BLOCK_EXTRA`].
pub const DAO_FORK_EXTRA_RANGE: u64 = 10;

/// Extra data required inside the DAO fork window ("dao-hard-fork").
pub const DAO_FORK_BLOCK_EXTRA: &[u8] = b"dao-hard-fork";

/// Blocks per explosion period of the difficulty bomb.
pub const EXP_DIFF_PERIOD: u64 = 100_000;

/// Divisor of the timestamp delta under EIP-2.
pub const EIP2_DIFFICULTY_INCREMENT_DIVISOR: i64 = 10;

/// Divisor of the timestamp delta under EIP-100B.
pub const EIP100B_DIFFICULTY_INCREMENT_DIVISOR: i64 = 9;

/// Lower clamp of the adjustment factor.
pub const MAX_ADJUSTMENT_DOWN: i64 = -99;

// Fixed bomb delays, measured in blocks.
pub const EIP649_DIFFICULTY_BOMB_DELAY: u64 = 3_000_000;
pub const EIP1234_DIFFICULTY_BOMB_DELAY: u64 = 5_000_000;
pub const EIP2384_DIFFICULTY_BOMB_DELAY: u64 = 9_000_000;
pub const EIP3554_DIFFICULTY_BOMB_DELAY: u64 = 9_700_000;
pub const EIP4345_DIFFICULTY_BOMB_DELAY: u64 = 10_700_000;
pub const EIP5133_DIFFICULTY_BOMB_DELAY: u64 = 11_400_000;

// ── Serde default helpers ──────────────────────────────────────────────

fn default_minimum_difficulty() -> u64 {
    131_072
}

fn default_difficulty_bound_divisor() -> u64 {
    2048
}

fn default_duration_limit() -> u64 {
    13
}

fn default_maximum_extra_data_size() -> u64 {
    32
}

fn default_gas_limit_bound_divisor() -> u64 {
    1024
}

fn default_min_gas_limit() -> u64 {
    5000
}

fn default_elasticity_multiplier() -> u64 {
    2
}

fn default_base_fee_change_denominator() -> u64 {
    8
}

fn default_initial_base_fee() -> u64 {
    1_000_000_000
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            minimum_difficulty: default_minimum_difficulty(),
            difficulty_bound_divisor: default_difficulty_bound_divisor(),
            duration_limit: default_duration_limit(),
            maximum_extra_data_size: default_maximum_extra_data_size(),
            gas_limit_bound_divisor: default_gas_limit_bound_divisor(),
            min_gas_limit: default_min_gas_limit(),
            elasticity_multiplier: default_elasticity_multiplier(),
            base_fee_change_denominator: default_base_fee_change_denominator(),
            initial_base_fee: default_initial_base_fee(),
        }
    }
}
