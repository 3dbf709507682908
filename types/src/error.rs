//! Errors raised while loading chain configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("config error: {0}")]
    Config(String),

    #[error("ECIP-1010 pause is configured without a length")]
    MissingPauseLength,

    #[error("bomb delay schedule sums past u64::MAX")]
    ScheduleOverflow,
}
