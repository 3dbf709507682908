//! Difficulty adjustment: a base rule chosen by fork activation, floored at
//! the protocol minimum, plus the exponential "bomb" term.
//!
//! Both the base rule and the bomb reference are picked from ordered tables;
//! the first entry whose fork is active at the child's number wins.

use alloy_primitives::U256;

use classic_types::params::{
    EIP100B_DIFFICULTY_INCREMENT_DIVISOR, EIP1234_DIFFICULTY_BOMB_DELAY,
    EIP2384_DIFFICULTY_BOMB_DELAY, EIP2_DIFFICULTY_INCREMENT_DIVISOR,
    EIP3554_DIFFICULTY_BOMB_DELAY, EIP4345_DIFFICULTY_BOMB_DELAY, EIP5133_DIFFICULTY_BOMB_DELAY,
    EIP649_DIFFICULTY_BOMB_DELAY, EXP_DIFF_PERIOD, MAX_ADJUSTMENT_DOWN,
};
use classic_types::{Configurator, Fork, Header, ProtocolParams};

/// Base adjustment rules in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjustmentRule {
    /// EIP-100: uncle-aware, 9-second step.
    Eip100B,
    /// Homestead: 10-second step.
    Eip2,
    /// The original rule: one step up or down around the duration limit.
    Frontier,
}

pub const ADJUSTMENT_RULES: [AdjustmentRule; 3] = [
    AdjustmentRule::Eip100B,
    AdjustmentRule::Eip2,
    AdjustmentRule::Frontier,
];

impl AdjustmentRule {
    pub fn applies(&self, config: &dyn Configurator, next: u64) -> bool {
        match self {
            AdjustmentRule::Eip100B => config.is_fork_active_at_block(Fork::Eip100B, next),
            AdjustmentRule::Eip2 => config.is_fork_active_at_block(Fork::Eip2, next),
            AdjustmentRule::Frontier => true,
        }
    }

    /// Parent difficulty adjusted for a child sealed at `time`. Not floored.
    pub fn adjust(&self, params: &ProtocolParams, time: u64, parent: &Header) -> U256 {
        let step = parent.difficulty / U256::from(params.difficulty_bound_divisor);
        let delta = i128::from(time) - i128::from(parent.time);

        let factor = match self {
            AdjustmentRule::Eip100B => {
                let base = if parent.has_empty_uncles() { 1 } else { 2 };
                base - delta.div_euclid(i128::from(EIP100B_DIFFICULTY_INCREMENT_DIVISOR))
            }
            AdjustmentRule::Eip2 => {
                1 - delta.div_euclid(i128::from(EIP2_DIFFICULTY_INCREMENT_DIVISOR))
            }
            AdjustmentRule::Frontier => {
                if delta < i128::from(params.duration_limit) {
                    1
                } else {
                    -1
                }
            }
        };
        let factor = factor.max(i128::from(MAX_ADJUSTMENT_DOWN));

        let magnitude = step.saturating_mul(U256::from(factor.unsigned_abs()));
        if factor >= 0 {
            parent.difficulty.saturating_add(magnitude)
        } else {
            parent.difficulty.saturating_sub(magnitude)
        }
    }
}

/// Sources of the bomb reference block, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BombSource {
    /// ECIP-1010: the bomb is frozen during the pause, then resumes shifted
    /// back by the pause length.
    Ecip1010,
    /// Cumulative delays from the configured schedule.
    Schedule,
    /// A single hard-coded delay tied to a fork.
    Fixed { fork: Fork, delay: u64 },
}

pub const BOMB_SOURCES: [BombSource; 8] = [
    BombSource::Ecip1010,
    BombSource::Schedule,
    BombSource::Fixed {
        fork: Fork::Eip5133,
        delay: EIP5133_DIFFICULTY_BOMB_DELAY,
    },
    BombSource::Fixed {
        fork: Fork::Eip4345,
        delay: EIP4345_DIFFICULTY_BOMB_DELAY,
    },
    BombSource::Fixed {
        fork: Fork::Eip3554,
        delay: EIP3554_DIFFICULTY_BOMB_DELAY,
    },
    BombSource::Fixed {
        fork: Fork::Eip2384,
        delay: EIP2384_DIFFICULTY_BOMB_DELAY,
    },
    BombSource::Fixed {
        fork: Fork::Eip1234,
        delay: EIP1234_DIFFICULTY_BOMB_DELAY,
    },
    BombSource::Fixed {
        fork: Fork::Eip649,
        delay: EIP649_DIFFICULTY_BOMB_DELAY,
    },
];

impl BombSource {
    pub fn applies(&self, config: &dyn Configurator, next: u64) -> bool {
        match self {
            BombSource::Ecip1010 => config.is_fork_active_at_block(Fork::Ecip1010, next),
            BombSource::Schedule => !config.bomb_delay_schedule().is_empty(),
            BombSource::Fixed { fork, .. } => config.is_fork_active_at_block(*fork, next),
        }
    }

    /// The block number the bomb is evaluated at for child `next`.
    pub fn reference(&self, config: &dyn Configurator, next: u64) -> u64 {
        match self {
            BombSource::Ecip1010 => {
                let pause = config.fork_block(Fork::Ecip1010).unwrap_or(0);
                let resume = config.ecip1010_continue_block().unwrap_or(pause);
                if next < resume {
                    pause
                } else {
                    next.saturating_sub(resume.saturating_sub(pause))
                }
            }
            BombSource::Schedule => {
                let delay = config.bomb_delay_schedule().cumulative_up_to(next);
                next.saturating_sub(delay.unwrap_or(u64::MAX))
            }
            // The parent number less `delay - 1`.
            BombSource::Fixed { delay, .. } => next.saturating_sub(*delay),
        }
    }
}

/// The base rule in force for child block `next`.
pub fn select_adjustment(config: &dyn Configurator, next: u64) -> AdjustmentRule {
    ADJUSTMENT_RULES
        .into_iter()
        .find(|rule| rule.applies(config, next))
        .unwrap_or(AdjustmentRule::Frontier)
}

/// The bomb reference source for child block `next`, if any.
pub fn select_bomb_source(config: &dyn Configurator, next: u64) -> Option<BombSource> {
    BOMB_SOURCES
        .into_iter()
        .find(|source| source.applies(config, next))
}

/// `2^(reference / 100000 - 2)`, or zero for the first two periods.
pub fn explosion(reference: u64) -> U256 {
    let periods = reference / EXP_DIFF_PERIOD;
    if periods < 2 {
        return U256::ZERO;
    }
    let exponent = periods - 2;
    if exponent >= 256 {
        return U256::MAX;
    }
    U256::from(1u8) << exponent as usize
}

/// Difficulty required of a child of `parent` sealed at `time`.
pub fn calc_difficulty(config: &dyn Configurator, time: u64, parent: &Header) -> U256 {
    let params = config.params();
    let next = parent.number.saturating_add(1);

    let adjusted = select_adjustment(config, next).adjust(params, time, parent);
    let floored = adjusted.max(U256::from(params.minimum_difficulty));

    if config.is_fork_active_at_block(Fork::Ecip1041, next) {
        return floored;
    }

    let reference = match select_bomb_source(config, next) {
        Some(source) => source.reference(config, next),
        None => next,
    };
    floored.saturating_add(explosion(reference))
}
