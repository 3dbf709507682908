//! Cryptographic primitives for the classic Ethash engine.
//!
//! - **Keccak-256 / Keccak-512** (the pre-standard padding used by Ethereum)
//! - **Header hash** and **seal hash**: RLP encodings of a header hashed with
//!   Keccak-256

pub mod hash;
pub mod header;

pub use hash::{keccak256, keccak256_multi, keccak512, Keccak512Hasher};
pub use header::{header_hash, seal_hash};
