//! Ledger snapshots: serializable state and its SHA-256 root
//!
//! Persistence belongs to the host. A snapshot captures everything the
//! ledger owns (not the asset accounts, which live elsewhere) so the host
//! can store it, compare state roots across replicas and rebuild a ledger.

use sale_types::ids::{Address, SaleId};
use sale_types::numeric::UnitScale;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::info;

use crate::asset::AssetAccount;
use crate::errors::SaleError;
use crate::ledger::{ParticipantSlot, SaleLedger};
use crate::release::ReleaseSchedule;
use crate::security::{AdminGate, IntakeState, ReentrancyGuard};

/// Complete ledger-owned state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub sale_id: SaleId,
    pub admin: Address,
    pub ledger_address: Address,
    pub intake: IntakeState,
    pub unit_price: u128,
    pub unit_scale: UnitScale,
    pub total_bought: u128,
    pub total_sent: u128,
    pub total_min_buy_allowed: u128,
    pub total_max_buy_allowed: u128,
    pub schedule: ReleaseSchedule,
    /// Participant arena in iteration order, tombstones included
    pub participants: Vec<ParticipantSlot>,
}

impl LedgerSnapshot {
    /// SHA-256 over the canonical JSON encoding.
    pub fn state_root(&self) -> Result<[u8; 32], SaleError> {
        let encoded = serde_json::to_vec(self).map_err(|e| SaleError::Snapshot(e.to_string()))?;
        Ok(compute_hash(&encoded))
    }

    /// Recompute the aggregates from the arena and compare.
    fn verify(&self) -> Result<(), SaleError> {
        self.schedule
            .validate()
            .map_err(|e| SaleError::Snapshot(format!("invalid schedule: {e}")))?;
        let mut min_total: u128 = 0;
        let mut max_total: u128 = 0;
        let mut bought: u128 = 0;
        let mut sent: u128 = 0;
        for record in self.participants.iter().filter_map(|slot| slot.record.as_ref()) {
            let reserved_base = record.reserved_base(self.unit_scale)?;
            if record.sent > reserved_base {
                return Err(SaleError::Snapshot(
                    "participant sent exceeds reservation".to_string(),
                ));
            }
            min_total = min_total
                .checked_add(record.min_buy_allowed)
                .ok_or(SaleError::Overflow)?;
            max_total = max_total
                .checked_add(record.max_buy_allowed)
                .ok_or(SaleError::Overflow)?;
            bought = bought.checked_add(reserved_base).ok_or(SaleError::Overflow)?;
            sent = sent.checked_add(record.sent).ok_or(SaleError::Overflow)?;
        }
        if min_total != self.total_min_buy_allowed
            || max_total != self.total_max_buy_allowed
            || bought != self.total_bought
            || sent != self.total_sent
        {
            return Err(SaleError::Snapshot(
                "aggregates do not match participant records".to_string(),
            ));
        }
        Ok(())
    }
}

impl<P: AssetAccount, S: AssetAccount> SaleLedger<P, S> {
    /// Capture the ledger-owned state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            sale_id: self.sale_id,
            admin: self.gate.admin().clone(),
            ledger_address: self.ledger_address.clone(),
            intake: self.gate.state(),
            unit_price: self.unit_price,
            unit_scale: self.unit_scale,
            total_bought: self.total_bought,
            total_sent: self.total_sent,
            total_min_buy_allowed: self.total_min_buy_allowed,
            total_max_buy_allowed: self.total_max_buy_allowed,
            schedule: self.schedule.clone(),
            participants: self.slots.clone(),
        }
    }

    /// Rebuild a ledger from a snapshot. The event log starts empty.
    pub fn restore(snapshot: LedgerSnapshot, payment: P, sale: S) -> Result<Self, SaleError> {
        snapshot.verify()?;

        let mut index = HashMap::with_capacity(snapshot.participants.len());
        for (position, slot) in snapshot.participants.iter().enumerate() {
            if index.insert(slot.address.clone(), position).is_some() {
                return Err(SaleError::Snapshot(format!(
                    "duplicate participant {}",
                    slot.address
                )));
            }
        }

        info!(
            sale_id = %snapshot.sale_id,
            participants = snapshot.participants.len(),
            stage = snapshot.schedule.current_release(),
            "Sale ledger restored"
        );

        Ok(Self {
            sale_id: snapshot.sale_id,
            ledger_address: snapshot.ledger_address,
            gate: AdminGate::with_state(snapshot.admin, snapshot.intake),
            reentrancy_guard: ReentrancyGuard::new(),
            payment,
            sale,
            unit_price: snapshot.unit_price,
            unit_scale: snapshot.unit_scale,
            slots: snapshot.participants,
            index,
            total_bought: snapshot.total_bought,
            total_sent: snapshot.total_sent,
            total_min_buy_allowed: snapshot.total_min_buy_allowed,
            total_max_buy_allowed: snapshot.total_max_buy_allowed,
            schedule: snapshot.schedule,
            events: Vec::new(),
        })
    }
}

/// Compute SHA-256 hash of data.
pub fn compute_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
