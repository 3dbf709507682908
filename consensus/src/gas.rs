//! Gas limit bounds and the EIP-1559 base fee.

use alloy_primitives::U256;

use classic_types::{Configurator, Fork, Header, ProtocolParams};

use crate::ConsensusError;

/// A gas limit may move by strictly less than `parent / bound_divisor` per
/// block and may never drop below the protocol minimum.
pub fn verify_gas_limit(
    params: &ProtocolParams,
    parent_gas_limit: u64,
    gas_limit: u64,
) -> Result<(), ConsensusError> {
    let diff = parent_gas_limit.abs_diff(gas_limit);
    let bound = parent_gas_limit / params.gas_limit_bound_divisor;
    if diff >= bound {
        return Err(ConsensusError::GasLimitInvalid {
            have: gas_limit,
            want: parent_gas_limit,
            bound: bound.saturating_sub(1),
        });
    }
    if gas_limit < params.min_gas_limit {
        return Err(ConsensusError::GasLimitBelowMinimum {
            have: gas_limit,
            min: params.min_gas_limit,
        });
    }
    Ok(())
}

/// Check the gas limit and base fee of a header at or after the EIP-1559
/// fork.
pub fn verify_eip1559_header(
    config: &dyn Configurator,
    parent: &Header,
    header: &Header,
) -> Result<(), ConsensusError> {
    let params = config.params();

    // The first fork block may double its target gas.
    let parent_gas_limit = if config.is_fork_active_at_block(Fork::Eip1559, parent.number) {
        parent.gas_limit
    } else {
        parent.gas_limit.saturating_mul(params.elasticity_multiplier)
    };
    verify_gas_limit(params, parent_gas_limit, header.gas_limit)?;

    let have = header.base_fee.ok_or(ConsensusError::MissingBaseFee)?;
    let want = calc_base_fee(config, parent);
    if have != want {
        return Err(ConsensusError::BaseFeeMismatch {
            have,
            want,
            parent_base_fee: parent.base_fee.unwrap_or_default(),
            parent_gas_used: parent.gas_used,
        });
    }
    Ok(())
}

/// Base fee of the child of `parent`.
pub fn calc_base_fee(config: &dyn Configurator, parent: &Header) -> U256 {
    let params = config.params();
    if !config.is_fork_active_at_block(Fork::Eip1559, parent.number) {
        return U256::from(params.initial_base_fee);
    }

    let parent_base_fee = parent.base_fee.unwrap_or_default();
    let target = parent.gas_limit / params.elasticity_multiplier;
    if parent.gas_used == target || target == 0 {
        return parent_base_fee;
    }

    let denominator = U256::from(params.base_fee_change_denominator);
    if parent.gas_used > target {
        let used_delta = U256::from(parent.gas_used - target);
        let delta = (parent_base_fee.saturating_mul(used_delta) / U256::from(target) / denominator)
            .max(U256::from(1u8));
        parent_base_fee.saturating_add(delta)
    } else {
        let used_delta = U256::from(target - parent.gas_used);
        let delta = parent_base_fee.saturating_mul(used_delta) / U256::from(target) / denominator;
        parent_base_fee.saturating_sub(delta)
    }
}
