//! Shared handle for concurrent hosts
//!
//! Every public operation runs to completion under one exclusive lock
//! scoped to the ledger, so aggregate reads and the writes that follow
//! them within a call are never interleaved with another caller. The clock
//! is read inside the lock, once per call.

use sale_types::ids::Address;
use std::sync::{Mutex, MutexGuard};

use crate::asset::AssetAccount;
use crate::clock::Clock;
use crate::errors::SaleError;
use crate::events::ContractEvent;
use crate::ledger::SaleLedger;

/// A `SaleLedger` behind a mutex, paired with its time source.
#[derive(Debug)]
pub struct SharedSale<P, S, C> {
    ledger: Mutex<SaleLedger<P, S>>,
    clock: C,
}

impl<P: AssetAccount, S: AssetAccount, C: Clock> SharedSale<P, S, C> {
    pub fn new(ledger: SaleLedger<P, S>, clock: C) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn lock_tokens(&self, caller: &Address, amount: u128) -> Result<u128, SaleError> {
        self.guard()?.lock_tokens(caller, amount)
    }

    pub fn lock_for_participant(
        &self,
        caller: &Address,
        address: &Address,
        amount: u128,
    ) -> Result<u128, SaleError> {
        self.guard()?.lock_for_participant(caller, address, amount)
    }

    pub fn close(&self, caller: &Address) -> Result<ContractEvent, SaleError> {
        self.guard()?.close(caller)
    }

    /// Run the next release stage at the clock's current time.
    pub fn release_tokens(&self, caller: &Address) -> Result<u128, SaleError> {
        let mut ledger = self.guard()?;
        let now = self.clock.now();
        ledger.release_tokens(caller, now)
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&mut SaleLedger<P, S>) -> T) -> Result<T, SaleError> {
        let mut ledger = self.guard()?;
        Ok(f(&mut ledger))
    }

    /// Unwrap the ledger, e.g. to snapshot it on shutdown.
    pub fn into_inner(self) -> Result<SaleLedger<P, S>, SaleError> {
        self.ledger.into_inner().map_err(|_| SaleError::LockPoisoned)
    }

    fn guard(&self) -> Result<MutexGuard<'_, SaleLedger<P, S>>, SaleError> {
        self.ledger.lock().map_err(|_| SaleError::LockPoisoned)
    }
}
