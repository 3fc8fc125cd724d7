//! Error types for the shared data model
//!
//! Only numeric failures live here; contract refusals are defined next to
//! the operations that raise them.

use thiserror::Error;

/// Amount scaling errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("Unsupported decimals: {decimals} (maximum is {max})")]
    UnsupportedDecimals { decimals: u32, max: u32 },

    #[error("Arithmetic overflow scaling {units} whole units")]
    Overflow { units: u128 },
}
