//! Ethash proof-of-work consensus rules.
//!
//! Given a header and its parent, decides whether the header is valid under
//! the chain's fork schedule:
//! - The required difficulty follows from the parent and the block time.
//! - Gas limit, base fee and extra data stay within protocol bounds.
//! - The seal's mix digest and result satisfy the declared difficulty.
//!
//! ## Module overview
//!
//! - [`difficulty`]: Difficulty adjustment and bomb schedule as ordered rule tables.
//! - [`gas`]: Gas limit bounds and the EIP-1559 base fee.
//! - [`dao`]: DAO hard-fork extra-data window.
//! - [`seal`]: Proof-of-work seal verification.
//! - [`verifier`]: Single-header verification against a known parent.
//! - [`batch`]: Concurrent batch verification with in-order results.
//! - [`uncles`]: Uncle inclusion rules.
//! - [`engine`]: [`EthashEngine`], the façade used by a chain.
//! - [`error`]: Consensus error types.

pub mod batch;
pub mod dao;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod gas;
pub mod seal;
pub mod uncles;
pub mod verifier;

pub use batch::{verify_batch, worker_count, BatchVerification, VerifyResult};
pub use dao::verify_dao_extra;
pub use difficulty::{calc_difficulty, AdjustmentRule, BombSource};
pub use engine::EthashEngine;
pub use error::ConsensusError;
pub use gas::{calc_base_fee, verify_eip1559_header, verify_gas_limit};
pub use seal::{meets_target, verify_seal};
pub use uncles::verify_uncles;
pub use verifier::HeaderVerifier;
