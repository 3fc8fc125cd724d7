//! Sale events
//!
//! Events are immutable records emitted by ledger operations. The ledger
//! appends them to an in-memory log that the host drains and forwards;
//! no ledger logic depends on their delivery.

use sale_types::ids::{Address, SaleId};
use serde::{Deserialize, Serialize};

/// Participant registered or its bounds overwritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAdded {
    pub sale_id: SaleId,
    pub participant: Address,
    pub min_buy_allowed: u128,
    pub max_buy_allowed: u128,
}

/// Participant record cleared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRemoved {
    pub sale_id: SaleId,
    pub participant: Address,
}

/// Whole units reserved for a participant
///
/// `paid` is zero for administrator locks that bypass payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensLocked {
    pub sale_id: SaleId,
    pub participant: Address,
    pub amount: u128,
    pub paid: u128,
}

/// Intake closed; reservations frozen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleClosed {
    pub sale_id: SaleId,
    pub total_bought: u128,
}

/// One release stage completed
///
/// `stage` is the zero-based index of the stage just completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFinished {
    pub sale_id: SaleId,
    pub stage: u64,
    pub tokens_sent: u128,
}

/// Asset moved out of the ledger's holdings by the administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSwept {
    pub sale_id: SaleId,
    pub asset: SweptAsset,
    pub receiver: Address,
    pub amount: u128,
}

/// Which of the two ledger assets a sweep moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweptAsset {
    Payment,
    Sale,
}

/// Enum wrapper for all sale events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    ParticipantAdded(ParticipantAdded),
    ParticipantRemoved(ParticipantRemoved),
    TokensLocked(TokensLocked),
    SaleClosed(SaleClosed),
    ReleaseFinished(ReleaseFinished),
    AssetSwept(AssetSwept),
}
