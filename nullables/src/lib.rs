//! Nullable infrastructure for deterministic testing.
//!
//! The engine reaches the outside world through two seams: the wall clock
//! (future-block check) and the chain reader (ancestor lookups). This crate
//! provides test-friendly implementations of both that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;

pub use chain::NullChain;
pub use clock::NullClock;
