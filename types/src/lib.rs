//! Fundamental types for the classic Ethash engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! block headers, fork identifiers, the chain configuration that answers
//! "is fork X active at block N?", activation schedules, and the reader traits
//! through which the engine looks up ancestors.

pub mod block;
pub mod chain;
pub mod config;
pub mod error;
pub mod fork;
pub mod header;
pub mod params;
pub mod schedule;
pub mod time;

pub use alloy_primitives::{Address, Bloom, Bytes, B256, U256};

pub use block::Block;
pub use chain::{ChainHeaderReader, ChainReader};
pub use config::{ChainConfig, Configurator};
pub use error::TypesError;
pub use fork::Fork;
pub use header::{BlockNonce, Header, EMPTY_UNCLE_HASH};
pub use params::ProtocolParams;
pub use schedule::ActivationSchedule;
pub use time::{Clock, SystemClock};
