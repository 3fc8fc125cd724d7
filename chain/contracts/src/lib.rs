//! Limited Token Sale Ledger & Staged Release
//!
//! This crate implements the accounting core of a limited token sale as an
//! embeddable library: participants reserve allocations of a sale asset by
//! paying in a payment asset, and after intake closes the reservations are
//! released in fixed, repeatable installments.
//!
//! # Modules
//! - `errors`: Sale, asset and config error types
//! - `events`: Sale events
//! - `security`: Administrative gate and reentrancy guard
//! - `asset`: Asset account interface and in-memory implementation
//! - `clock`: Time sources
//! - `config`: Sale round configuration
//! - `ledger`: Participants, bounds and reservations
//! - `release`: Staged disbursement
//! - `snapshot`: Serializable state and state root
//! - `shared`: Mutex-serialized handle for concurrent hosts
//!
//! # Version
//! v0.1.0

pub mod errors;
pub mod events;
pub mod security;
pub mod asset;
pub mod clock;
pub mod config;
pub mod ledger;
pub mod release;
pub mod snapshot;
pub mod shared;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
