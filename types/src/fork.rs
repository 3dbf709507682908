//! Identifiers of the protocol upgrades the engine consults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A protocol upgrade whose activation changes engine behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fork {
    /// Homestead difficulty adjustment (divisor 10).
    Eip2,
    /// Byzantium uncle-aware difficulty adjustment (divisor 9).
    Eip100B,
    /// Byzantium bomb delay (3M).
    Eip649,
    /// Constantinople bomb delay (5M).
    Eip1234,
    /// Muir Glacier bomb delay (9M).
    Eip2384,
    /// London bomb delay (9.7M).
    Eip3554,
    /// Arrow Glacier bomb delay (10.7M).
    Eip4345,
    /// Gray Glacier bomb delay (11.4M).
    Eip5133,
    /// DAO hard-fork extra-data window.
    Eip779,
    /// Base fee.
    Eip1559,
    /// Shanghai initcode metering; unsupported by this engine.
    Eip3860,
    /// Cancun blobs; unsupported by this engine.
    Eip4844,
    /// Difficulty bomb pause.
    Ecip1010,
    /// Difficulty bomb disposal.
    Ecip1041,
    /// Etchash: doubled epoch length.
    Ecip1099,
}

impl Fork {
    pub const ALL: [Fork; 15] = [
        Fork::Eip2,
        Fork::Eip100B,
        Fork::Eip649,
        Fork::Eip1234,
        Fork::Eip2384,
        Fork::Eip3554,
        Fork::Eip4345,
        Fork::Eip5133,
        Fork::Eip779,
        Fork::Eip1559,
        Fork::Eip3860,
        Fork::Eip4844,
        Fork::Ecip1010,
        Fork::Ecip1041,
        Fork::Ecip1099,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Fork::Eip2 => "eip2",
            Fork::Eip100B => "eip100b",
            Fork::Eip649 => "eip649",
            Fork::Eip1234 => "eip1234",
            Fork::Eip2384 => "eip2384",
            Fork::Eip3554 => "eip3554",
            Fork::Eip4345 => "eip4345",
            Fork::Eip5133 => "eip5133",
            Fork::Eip779 => "eip779",
            Fork::Eip1559 => "eip1559",
            Fork::Eip3860 => "eip3860",
            Fork::Eip4844 => "eip4844",
            Fork::Ecip1010 => "ecip1010",
            Fork::Ecip1041 => "ecip1041",
            Fork::Ecip1099 => "ecip1099",
        }
    }
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
