//! The consensus engine façade tying chain rules, the Ethash context and the
//! wall clock together.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use tracing::debug;

use classic_crypto::{header_hash, seal_hash};
use classic_ethash::{Ethash, EthashConfig, PowMode};
use classic_types::{
    Block, ChainHeaderReader, ChainReader, Clock, Configurator, Fork, Header, SystemClock,
};

use crate::batch::{verify_batch, worker_count, BatchVerification};
use crate::difficulty::calc_difficulty;
use crate::seal::verify_seal;
use crate::uncles::verify_uncles;
use crate::verifier::HeaderVerifier;
use crate::ConsensusError;

/// Proof-of-work consensus engine for Ethereum Classic style chains.
///
/// The engine owns its Ethash context; the chain configuration and clock are
/// shared with the caller.
pub struct EthashEngine {
    config: Arc<dyn Configurator>,
    ethash: Arc<Ethash>,
    clock: Arc<dyn Clock>,
    verifier: HeaderVerifier,
}

impl EthashEngine {
    /// Create an engine reading time from the system clock.
    ///
    /// The ECIP-1099 activation block is taken from `config`, overriding
    /// whatever `ethash_config` carries.
    pub fn new(config: Arc<dyn Configurator>, ethash_config: EthashConfig) -> Self {
        Self::with_clock(config, ethash_config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: Arc<dyn Configurator>,
        ethash_config: EthashConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ecip1099 = config.fork_block(Fork::Ecip1099);
        let ethash = Arc::new(Ethash::new(ethash_config.with_ecip1099_block(ecip1099)));
        let verifier = HeaderVerifier::new(Arc::clone(&config), Arc::clone(&ethash));
        Self {
            config,
            ethash,
            clock,
            verifier,
        }
    }

    pub fn config(&self) -> &dyn Configurator {
        self.config.as_ref()
    }

    pub fn ethash(&self) -> &Arc<Ethash> {
        &self.ethash
    }

    pub fn verifier(&self) -> &HeaderVerifier {
        &self.verifier
    }

    fn full_fake(&self) -> bool {
        self.ethash.config().pow_mode == PowMode::FullFake
    }

    /// The account credited with mining `header`.
    pub fn author(&self, header: &Header) -> Address {
        header.coinbase
    }

    /// The hash a seal commits to.
    pub fn seal_hash(&self, header: &Header) -> B256 {
        seal_hash(header)
    }

    /// Difficulty required of a child of `parent` stamped `time`.
    pub fn calc_difficulty(&self, time: u64, parent: &Header) -> U256 {
        calc_difficulty(self.config(), time, parent)
    }

    /// Fill in the difficulty of a header under construction.
    pub fn prepare(
        &self,
        chain: &dyn ChainHeaderReader,
        header: &mut Header,
    ) -> Result<(), ConsensusError> {
        let parent = header
            .number
            .checked_sub(1)
            .and_then(|number| chain.get_header(&header.parent_hash, number))
            .ok_or(ConsensusError::UnknownAncestor)?;
        header.difficulty = self.calc_difficulty(header.time, &parent);
        Ok(())
    }

    /// Verify a single header against its parent in `chain`.
    ///
    /// Headers the chain already holds are accepted without further checks.
    pub fn verify_header(
        &self,
        chain: &dyn ChainHeaderReader,
        header: &Header,
        seal: bool,
    ) -> Result<(), ConsensusError> {
        if self.full_fake() {
            return Ok(());
        }
        if chain.get_header(&header_hash(header), header.number).is_some() {
            return Ok(());
        }
        let parent = header
            .number
            .checked_sub(1)
            .and_then(|number| chain.get_header(&header.parent_hash, number))
            .ok_or(ConsensusError::UnknownAncestor)?;
        self.verifier
            .verify(header, &parent, false, seal, self.clock.now())
    }

    /// Verify a contiguous batch of headers concurrently.
    ///
    /// Results arrive in input order on the returned handle. `seals[i]`
    /// selects whether header `i`'s seal is checked.
    pub fn verify_headers(
        &self,
        chain: Arc<dyn ChainHeaderReader>,
        headers: Vec<Header>,
        seals: Vec<bool>,
    ) -> BatchVerification {
        if self.full_fake() || headers.is_empty() {
            return BatchVerification::ready(headers.iter().map(|_| Ok(())));
        }
        let workers = worker_count(headers.len());
        debug!(
            first = headers[0].number,
            count = headers.len(),
            workers,
            "Dispatching header batch"
        );
        verify_batch(
            self.verifier.clone(),
            chain,
            headers,
            seals,
            self.clock.now(),
            workers,
        )
    }

    /// Verify the uncles included in `block`.
    pub fn verify_uncles(
        &self,
        chain: &dyn ChainReader,
        block: &Block,
    ) -> Result<(), ConsensusError> {
        verify_uncles(&self.verifier, chain, block, self.clock.now())
    }

    /// Verify `header`'s seal, using the resident dataset when `full_dag`
    /// is set and it is already generated.
    pub fn verify_seal(&self, header: &Header, full_dag: bool) -> Result<(), ConsensusError> {
        verify_seal(&self.ethash, header, full_dag)
    }

    /// Release every resident cache and dataset.
    pub fn close(&self) {
        self.ethash.close();
    }
}
