//! Extra-data marker required around the DAO hard fork.

use classic_types::params::{DAO_FORK_BLOCK_EXTRA, DAO_FORK_EXTRA_RANGE};
use classic_types::{Configurator, Fork, Header};

use crate::ConsensusError;

/// Blocks in `[fork, fork + 10)` must carry the pro-fork extra-data marker.
/// Chains without a DAO fork block accept anything.
pub fn verify_dao_extra(config: &dyn Configurator, header: &Header) -> Result<(), ConsensusError> {
    let Some(fork) = config.fork_block(Fork::Eip779) else {
        return Ok(());
    };
    let in_window = header.number >= fork && header.number < fork.saturating_add(DAO_FORK_EXTRA_RANGE);
    if in_window && header.extra.as_ref() != DAO_FORK_BLOCK_EXTRA {
        return Err(ConsensusError::BadDaoExtra);
    }
    Ok(())
}
