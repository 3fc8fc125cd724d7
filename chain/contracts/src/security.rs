//! Shared security primitives for the sale ledger
//!
//! Provides the administrative gate (a single administrator plus a
//! two-state intake switch) and the reentrancy guard held across external
//! asset calls.

use sale_types::ids::Address;
use serde::{Deserialize, Serialize};

use crate::errors::SaleError;

/// Reentrancy guard preventing nested calls into protected functions.
///
/// A ledger function acquires the guard before executing state-changing
/// logic and releases it on completion. Any nested call attempt fails.
#[derive(Debug, Clone)]
pub struct ReentrancyGuard {
    locked: bool,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self { locked: false }
    }

    /// Acquire the guard. Returns `true` if successfully acquired.
    /// Returns `false` if already locked (reentrancy attempt).
    pub fn acquire(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    /// Release the guard.
    pub fn release(&mut self) {
        self.locked = false;
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-administrator access control.
#[derive(Debug, Clone)]
pub struct AccessControl {
    admin: Address,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: impl Into<Address>) -> Self {
        Self {
            admin: admin.into(),
        }
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.admin == *caller
    }

    /// Transfer admin to a new address.
    pub fn transfer_admin(&mut self, current_admin: &Address, new_admin: impl Into<Address>) -> bool {
        if !self.is_admin(current_admin) {
            return false;
        }
        self.admin = new_admin.into();
        true
    }

    /// Get the current admin identifier.
    pub fn admin(&self) -> &Address {
        &self.admin
    }
}

/// Intake state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeState {
    /// Participants may be managed and reservations made
    Open,
    /// Reservations frozen; releases permitted
    Closed,
}

/// Administrative gate: capability check plus the one-way intake switch.
#[derive(Debug, Clone)]
pub struct AdminGate {
    access_control: AccessControl,
    state: IntakeState,
}

impl AdminGate {
    /// New gate with intake open.
    pub fn new(admin: impl Into<Address>) -> Self {
        Self::with_state(admin, IntakeState::Open)
    }

    pub(crate) fn with_state(admin: impl Into<Address>, state: IntakeState) -> Self {
        Self {
            access_control: AccessControl::new(admin),
            state,
        }
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        self.access_control.is_admin(caller)
    }

    pub fn admin(&self) -> &Address {
        self.access_control.admin()
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == IntakeState::Open
    }

    pub fn require_admin(&self, caller: &Address) -> Result<(), SaleError> {
        if !self.is_admin(caller) {
            return Err(SaleError::Unauthorized);
        }
        Ok(())
    }

    pub fn require_open(&self) -> Result<(), SaleError> {
        if self.state != IntakeState::Open {
            return Err(SaleError::state("intake is closed"));
        }
        Ok(())
    }

    pub fn require_closed(&self) -> Result<(), SaleError> {
        if self.state != IntakeState::Closed {
            return Err(SaleError::state("intake is still open"));
        }
        Ok(())
    }

    /// Close intake. There is no way back to `Open`.
    pub fn close(&mut self, caller: &Address) -> Result<(), SaleError> {
        self.require_admin(caller)?;
        self.require_open()?;
        self.state = IntakeState::Closed;
        Ok(())
    }

    pub fn transfer_admin(&mut self, caller: &Address, new_admin: impl Into<Address>) -> Result<(), SaleError> {
        if !self.access_control.transfer_admin(caller, new_admin) {
            return Err(SaleError::Unauthorized);
        }
        Ok(())
    }
}
