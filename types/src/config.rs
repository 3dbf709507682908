//! Chain configuration and the narrow query surface the engine consumes.

use alloy_primitives::{b256, B256, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::fork::Fork;
use crate::params::ProtocolParams;
use crate::schedule::ActivationSchedule;
use crate::TypesError;

/// Read-only view of a chain's fork schedule and protocol parameters.
///
/// The engine only ever asks "is fork X active at block/time N?" and "what is
/// parameter Y?"; it never mutates configuration.
pub trait Configurator: Send + Sync {
    /// Activation block of `fork`, if it is scheduled by block number.
    fn fork_block(&self, fork: Fork) -> Option<u64>;

    /// Activation timestamp of `fork`, if it is scheduled by time.
    fn fork_time(&self, _fork: Fork) -> Option<u64> {
        None
    }

    fn is_fork_active_at_block(&self, fork: Fork, number: u64) -> bool {
        self.fork_block(fork).is_some_and(|activation| activation <= number)
    }

    fn is_fork_active_at_time(&self, fork: Fork, time: u64) -> bool {
        self.fork_time(fork).is_some_and(|activation| activation <= time)
    }

    /// First block after the ECIP-1010 pause, if the pause is configured.
    fn ecip1010_continue_block(&self) -> Option<u64>;

    /// Cumulative bomb delays, keyed by activation block.
    fn bomb_delay_schedule(&self) -> &ActivationSchedule<u64>;

    /// Base block reward (wei), keyed by activation block.
    fn block_reward_schedule(&self) -> &ActivationSchedule<U256>;

    /// Hash a block at `number` must have to be accepted, if pinned.
    fn required_block_hash(&self, number: u64) -> Option<B256>;

    fn params(&self) -> &ProtocolParams;
}

/// Fork schedule and parameters for a chain, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub chain_id: u64,

    // ── Difficulty adjustment ────────────────────────────────────────────
    #[serde(default)]
    pub eip2_block: Option<u64>,
    #[serde(default)]
    pub eip100b_block: Option<u64>,

    // ── Difficulty bomb ──────────────────────────────────────────────────
    #[serde(default)]
    pub ecip1010_pause_block: Option<u64>,
    #[serde(default)]
    pub ecip1010_length: Option<u64>,
    #[serde(default)]
    pub ecip1041_block: Option<u64>,
    #[serde(default)]
    pub eip649_block: Option<u64>,
    #[serde(default)]
    pub eip1234_block: Option<u64>,
    #[serde(default)]
    pub eip2384_block: Option<u64>,
    #[serde(default)]
    pub eip3554_block: Option<u64>,
    #[serde(default)]
    pub eip4345_block: Option<u64>,
    #[serde(default)]
    pub eip5133_block: Option<u64>,
    #[serde(default)]
    pub bomb_delays: ActivationSchedule<u64>,

    // ── Header rules ─────────────────────────────────────────────────────
    #[serde(default)]
    pub dao_fork_block: Option<u64>,
    #[serde(default)]
    pub eip1559_block: Option<u64>,
    #[serde(default)]
    pub eip3860_block: Option<u64>,
    #[serde(default)]
    pub eip3860_time: Option<u64>,
    #[serde(default)]
    pub eip4844_time: Option<u64>,

    // ── Ethash ───────────────────────────────────────────────────────────
    #[serde(default)]
    pub ecip1099_block: Option<u64>,

    // ── Misc ─────────────────────────────────────────────────────────────
    #[serde(default)]
    pub block_rewards: ActivationSchedule<U256>,
    #[serde(default)]
    pub required_hashes: ActivationSchedule<B256>,
    #[serde(default)]
    pub params: ProtocolParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_name() -> String {
    "custom".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

/// 1 ether in wei.
const ETHER: u64 = 1_000_000_000_000_000_000;

impl ChainConfig {
    /// A configuration with every fork unscheduled (Frontier rules forever).
    pub fn frontier() -> Self {
        Self {
            name: default_name(),
            chain_id: 0,
            eip2_block: None,
            eip100b_block: None,
            ecip1010_pause_block: None,
            ecip1010_length: None,
            ecip1041_block: None,
            eip649_block: None,
            eip1234_block: None,
            eip2384_block: None,
            eip3554_block: None,
            eip4345_block: None,
            eip5133_block: None,
            bomb_delays: ActivationSchedule::new(),
            dao_fork_block: None,
            eip1559_block: None,
            eip3860_block: None,
            eip3860_time: None,
            eip4844_time: None,
            ecip1099_block: None,
            block_rewards: ActivationSchedule::new().with(0, U256::from(5 * ETHER)),
            required_hashes: ActivationSchedule::new(),
            params: ProtocolParams::default(),
        }
    }

    /// Ethereum Classic mainnet.
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            chain_id: 61,
            eip2_block: Some(1_150_000),
            eip100b_block: Some(8_772_000),
            ecip1010_pause_block: Some(3_000_000),
            ecip1010_length: Some(2_000_000),
            ecip1041_block: Some(5_900_000),
            ecip1099_block: Some(11_700_000),
            block_rewards: ecip1017_rewards(5_000_000, 8),
            required_hashes: ActivationSchedule::new()
                .with(
                    1_920_000,
                    b256!("94365e3a8c0b35089c1d1195081fe7489b528a84b22199c916180db8b28ade7f"),
                )
                .with(
                    2_500_000,
                    b256!("ca12c63534f565899681965528d536c52cb05b7c48e269c2a6cb77ad864d878a"),
                ),
            ..Self::frontier()
        }
    }

    /// Mordor testnet.
    pub fn mordor() -> Self {
        Self {
            name: "mordor".to_string(),
            chain_id: 63,
            eip2_block: Some(0),
            eip100b_block: Some(0),
            ecip1041_block: Some(0),
            ecip1099_block: Some(2_520_000),
            block_rewards: ecip1017_rewards(2_000_000, 8),
            ..Self::frontier()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TypesError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TypesError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, TypesError> {
        let config: Self = toml::from_str(s).map_err(|e| TypesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, TypesError> {
        toml::to_string_pretty(self).map_err(|e| TypesError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), TypesError> {
        if self.ecip1010_pause_block.is_some() && self.ecip1010_length.is_none() {
            return Err(TypesError::MissingPauseLength);
        }
        if self.bomb_delays.cumulative_up_to(u64::MAX).is_none() {
            return Err(TypesError::ScheduleOverflow);
        }
        Ok(())
    }
}

/// ECIP-1017 monetary policy: a 5 ether base reward reduced by 20% every era.
fn ecip1017_rewards(era_rounds: u64, eras: u64) -> ActivationSchedule<U256> {
    let mut reward = U256::from(5 * ETHER);
    let mut schedule = ActivationSchedule::new();
    for era in 0..eras {
        schedule.insert(era * era_rounds, reward);
        reward = reward * U256::from(4) / U256::from(5);
    }
    schedule
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl Configurator for ChainConfig {
    fn fork_block(&self, fork: Fork) -> Option<u64> {
        match fork {
            Fork::Eip2 => self.eip2_block,
            Fork::Eip100B => self.eip100b_block,
            Fork::Eip649 => self.eip649_block,
            Fork::Eip1234 => self.eip1234_block,
            Fork::Eip2384 => self.eip2384_block,
            Fork::Eip3554 => self.eip3554_block,
            Fork::Eip4345 => self.eip4345_block,
            Fork::Eip5133 => self.eip5133_block,
            Fork::Eip779 => self.dao_fork_block,
            Fork::Eip1559 => self.eip1559_block,
            Fork::Eip3860 => self.eip3860_block,
            Fork::Eip4844 => None,
            Fork::Ecip1010 => self.ecip1010_pause_block,
            Fork::Ecip1041 => self.ecip1041_block,
            Fork::Ecip1099 => self.ecip1099_block,
        }
    }

    fn fork_time(&self, fork: Fork) -> Option<u64> {
        match fork {
            Fork::Eip3860 => self.eip3860_time,
            Fork::Eip4844 => self.eip4844_time,
            _ => None,
        }
    }

    fn ecip1010_continue_block(&self) -> Option<u64> {
        let pause = self.ecip1010_pause_block?;
        Some(pause.saturating_add(self.ecip1010_length.unwrap_or(0)))
    }

    fn bomb_delay_schedule(&self) -> &ActivationSchedule<u64> {
        &self.bomb_delays
    }

    fn block_reward_schedule(&self) -> &ActivationSchedule<U256> {
        &self.block_rewards
    }

    fn required_block_hash(&self, number: u64) -> Option<B256> {
        self.required_hashes.get(number).copied()
    }

    fn params(&self) -> &ProtocolParams {
        &self.params
    }
}
