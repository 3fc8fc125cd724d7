//! Types library for the limited token sale ledger
//!
//! This library provides the core type definitions shared by the sale
//! contracts: identities, amount scaling and the participant record.
//!
//! # Version
//! v1.0.0 - Frozen data model
//!
//! # Modules
//! - `ids`: Identifiers (Address, SaleId)
//! - `numeric`: Unit scaling between whole units and smallest denomination
//! - `participant`: Participant record and its accounting invariants
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod participant;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::participant::*;
    pub use crate::errors::*;
}
