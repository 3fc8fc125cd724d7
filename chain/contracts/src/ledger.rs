//! Sale Ledger: participants, purchase bounds and reservations
//!
//! Implements the intake side of a limited sale:
//! - Participant registry with inclusive min/max purchase bounds
//! - Running totals of bounds, kept consistent on every mutation
//! - Paid reservations (`lock_tokens`) against a payment asset
//! - Administrator reservations (`lock_for_participant`) without payment
//! - Sweeps of the payment asset and of sale-asset surplus
//!
//! Participants live in an append-only arena in registration order.
//! Removal leaves a tombstone in place so the release iteration order
//! never changes.

use sale_types::ids::{Address, SaleId};
use sale_types::numeric::UnitScale;
use sale_types::participant::Participant;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::asset::AssetAccount;
use crate::errors::{LimitKind, SaleError};
use crate::events::{
    AssetSwept, ContractEvent, ParticipantAdded, ParticipantRemoved, SaleClosed, SweptAsset,
    TokensLocked,
};
use crate::release::ReleaseSchedule;
use crate::security::{AdminGate, IntakeState, ReentrancyGuard};

/// One entry of the participant arena.
///
/// `record` is `None` once the participant has been removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSlot {
    pub address: Address,
    pub record: Option<Participant>,
}

/// Limited sale ledger.
///
/// All state-changing operations check, in order:
/// 1. Access control (where applicable)
/// 2. Intake state
/// 3. Reentrancy guard (operations that call out to an asset)
/// 4. Operation-specific validation
///
/// A refused call leaves every counter untouched.
#[derive(Debug)]
pub struct SaleLedger<P, S> {
    pub(crate) sale_id: SaleId,
    /// Account holding the ledger's payment and sale assets
    pub(crate) ledger_address: Address,
    pub(crate) gate: AdminGate,
    pub(crate) reentrancy_guard: ReentrancyGuard,
    pub(crate) payment: P,
    pub(crate) sale: S,
    /// Payment-asset smallest units per whole sale unit
    pub(crate) unit_price: u128,
    pub(crate) unit_scale: UnitScale,
    pub(crate) slots: Vec<ParticipantSlot>,
    pub(crate) index: HashMap<Address, usize>,
    /// Sum of all reservations, smallest denomination
    pub(crate) total_bought: u128,
    /// Sum of all disbursements, smallest denomination
    pub(crate) total_sent: u128,
    pub(crate) total_min_buy_allowed: u128,
    pub(crate) total_max_buy_allowed: u128,
    pub(crate) schedule: ReleaseSchedule,
    /// Emitted events log (append-only)
    pub(crate) events: Vec<ContractEvent>,
}

impl<P: AssetAccount, S: AssetAccount> SaleLedger<P, S> {
    /// Create a ledger with intake open and no participants.
    pub fn new(
        admin: impl Into<Address>,
        ledger_address: impl Into<Address>,
        unit_price: u128,
        unit_scale: UnitScale,
        schedule: ReleaseSchedule,
        payment: P,
        sale: S,
    ) -> Self {
        let ledger = Self {
            sale_id: SaleId::new(),
            ledger_address: ledger_address.into(),
            gate: AdminGate::new(admin),
            reentrancy_guard: ReentrancyGuard::new(),
            payment,
            sale,
            unit_price,
            unit_scale,
            slots: Vec::new(),
            index: HashMap::new(),
            total_bought: 0,
            total_sent: 0,
            total_min_buy_allowed: 0,
            total_max_buy_allowed: 0,
            schedule,
            events: Vec::new(),
        };
        info!(
            sale_id = %ledger.sale_id,
            admin = %ledger.gate.admin(),
            unit_price,
            decimals = unit_scale.decimals(),
            "Sale ledger created"
        );
        ledger
    }

    // ───────────────────────── Participants ─────────────────────────

    /// Register a participant or overwrite its bounds. Admin-only, intake open.
    ///
    /// Overwriting keeps `reserved` and `sent`; the running totals swap the
    /// old bounds for the new ones. A removed address reuses its slot.
    pub fn add_participant(
        &mut self,
        caller: &Address,
        address: &Address,
        min_buy_allowed: u128,
        max_buy_allowed: u128,
    ) -> Result<ContractEvent, SaleError> {
        self.authorize(caller, "add_participant")?;
        self.gate.require_open()?;

        if min_buy_allowed > max_buy_allowed {
            return Err(SaleError::InvalidBounds {
                min: min_buy_allowed,
                max: max_buy_allowed,
            });
        }

        let previous = self.participant(address).copied();
        let (old_min, old_max) = previous
            .map(|p| (p.min_buy_allowed, p.max_buy_allowed))
            .unwrap_or((0, 0));
        let total_min = (self.total_min_buy_allowed - old_min)
            .checked_add(min_buy_allowed)
            .ok_or(SaleError::Overflow)?;
        let total_max = (self.total_max_buy_allowed - old_max)
            .checked_add(max_buy_allowed)
            .ok_or(SaleError::Overflow)?;

        let record = match previous {
            Some(existing) => Participant {
                min_buy_allowed,
                max_buy_allowed,
                ..existing
            },
            None => Participant::new(min_buy_allowed, max_buy_allowed),
        };

        match self.index.get(address) {
            Some(&position) => self.slots[position].record = Some(record),
            None => {
                self.index.insert(address.clone(), self.slots.len());
                self.slots.push(ParticipantSlot {
                    address: address.clone(),
                    record: Some(record),
                });
            }
        }
        self.total_min_buy_allowed = total_min;
        self.total_max_buy_allowed = total_max;

        info!(
            sale_id = %self.sale_id,
            participant = %address,
            min_buy_allowed,
            max_buy_allowed,
            overwrite = previous.is_some(),
            "Participant added"
        );

        Ok(self.emit(ContractEvent::ParticipantAdded(ParticipantAdded {
            sale_id: self.sale_id,
            participant: address.clone(),
            min_buy_allowed,
            max_buy_allowed,
        })))
    }

    /// Clear a participant's record. Admin-only, intake open, nothing reserved.
    pub fn remove_participant(
        &mut self,
        caller: &Address,
        address: &Address,
    ) -> Result<ContractEvent, SaleError> {
        self.authorize(caller, "remove_participant")?;
        self.gate.require_open()?;

        let position = self
            .position(address)
            .ok_or_else(|| SaleError::state("participant not registered"))?;
        let record = self.slots[position]
            .record
            .ok_or_else(|| SaleError::state("participant not registered"))?;
        if record.has_reservation() {
            return Err(SaleError::state(
                "cannot remove participant with outstanding reservation",
            ));
        }

        self.total_min_buy_allowed -= record.min_buy_allowed;
        self.total_max_buy_allowed -= record.max_buy_allowed;
        self.slots[position].record = None;

        info!(sale_id = %self.sale_id, participant = %address, "Participant removed");

        Ok(self.emit(ContractEvent::ParticipantRemoved(ParticipantRemoved {
            sale_id: self.sale_id,
            participant: address.clone(),
        })))
    }

    // ───────────────────────── Reservations ─────────────────────────

    /// Reserve `amount` whole sale units for the caller, paying
    /// `amount * unit_price` in the payment asset. Intake open.
    ///
    /// Validation order, first failure wins: supply, max bound, min bound,
    /// payment balance, payment allowance. Both bounds are inclusive.
    ///
    /// Ledger counters are updated before the payment is pulled; a failed
    /// pull restores them.
    pub fn lock_tokens(&mut self, caller: &Address, amount: u128) -> Result<u128, SaleError> {
        self.gate.require_open()?;
        self.enter()?;
        let result = self.lock_tokens_inner(caller, amount);
        self.reentrancy_guard.release();
        result
    }

    fn lock_tokens_inner(&mut self, caller: &Address, amount: u128) -> Result<u128, SaleError> {
        if amount == 0 {
            return Err(SaleError::InvalidAmount);
        }
        let amount_base = self.unit_scale.to_base(amount)?;
        let total_bought = self.check_supply(amount_base)?;

        let current = self.participant(caller).copied().unwrap_or_default();
        let reserved = current
            .reserved
            .checked_add(amount)
            .ok_or(SaleError::Overflow)?;
        if reserved > current.max_buy_allowed {
            return Err(SaleError::LimitExceeded(LimitKind::BuyHigh));
        }
        if reserved < current.min_buy_allowed {
            return Err(SaleError::LimitExceeded(LimitKind::BelowMinimum));
        }

        let required = amount
            .checked_mul(self.unit_price)
            .ok_or(SaleError::Overflow)?;
        let available = self.payment.balance_of(caller);
        if available < required {
            return Err(SaleError::InsufficientFunds {
                required,
                available,
            });
        }
        let approved = self.payment.allowance(caller, &self.ledger_address);
        if approved < required {
            return Err(SaleError::InsufficientAuthorization { required, approved });
        }

        // Effects
        let position = self
            .position(caller)
            .ok_or(SaleError::LimitExceeded(LimitKind::BuyHigh))?;
        let previous_total = self.total_bought;
        self.set_reserved(position, reserved);
        self.total_bought = total_bought;

        // Interaction
        if let Err(err) = self.payment.transfer_from(
            &self.ledger_address,
            caller,
            &self.ledger_address,
            required,
        ) {
            self.set_reserved(position, current.reserved);
            self.total_bought = previous_total;
            warn!(
                sale_id = %self.sale_id,
                participant = %caller,
                error = %err,
                "Payment pull failed; reservation rolled back"
            );
            return Err(err.into());
        }

        info!(
            sale_id = %self.sale_id,
            participant = %caller,
            amount,
            paid = required,
            reserved,
            "Tokens locked"
        );

        self.emit(ContractEvent::TokensLocked(TokensLocked {
            sale_id: self.sale_id,
            participant: caller.clone(),
            amount,
            paid: required,
        }));
        Ok(amount)
    }

    /// Reserve `amount` whole sale units for `address` without payment.
    /// Admin-only, intake open.
    ///
    /// Unlike `lock_tokens`, the bounds here are strict: the new total must
    /// be above `min_buy_allowed` and below `max_buy_allowed`.
    pub fn lock_for_participant(
        &mut self,
        caller: &Address,
        address: &Address,
        amount: u128,
    ) -> Result<u128, SaleError> {
        self.authorize(caller, "lock_for_participant")?;
        self.gate.require_open()?;

        if amount == 0 {
            return Err(SaleError::InvalidAmount);
        }
        let amount_base = self.unit_scale.to_base(amount)?;
        let total_bought = self.check_supply(amount_base)?;

        let current = self.participant(address).copied().unwrap_or_default();
        let reserved = current
            .reserved
            .checked_add(amount)
            .ok_or(SaleError::Overflow)?;
        if reserved >= current.max_buy_allowed {
            return Err(SaleError::LimitExceeded(LimitKind::BuyHigh));
        }
        if reserved <= current.min_buy_allowed {
            return Err(SaleError::LimitExceeded(LimitKind::BelowMinimum));
        }

        let position = self
            .position(address)
            .ok_or(SaleError::LimitExceeded(LimitKind::BuyHigh))?;
        self.set_reserved(position, reserved);
        self.total_bought = total_bought;

        info!(
            sale_id = %self.sale_id,
            participant = %address,
            amount,
            reserved,
            "Tokens locked by admin"
        );

        self.emit(ContractEvent::TokensLocked(TokensLocked {
            sale_id: self.sale_id,
            participant: address.clone(),
            amount,
            paid: 0,
        }));
        Ok(amount)
    }

    /// Returns the new `total_bought` if the holdings cover it.
    fn check_supply(&self, amount_base: u128) -> Result<u128, SaleError> {
        let required = self
            .total_bought
            .checked_add(amount_base)
            .ok_or(SaleError::Overflow)?;
        let available = self.sale.balance_of(&self.ledger_address);
        if required > available {
            return Err(SaleError::InsufficientSupply {
                required,
                available,
            });
        }
        Ok(required)
    }

    fn set_reserved(&mut self, position: usize, reserved: u128) {
        if let Some(record) = self.slots[position].record.as_mut() {
            record.reserved = reserved;
        }
    }

    // ───────────────────────── Administration ─────────────────────────

    /// Close intake. Admin-only; irreversible.
    pub fn close(&mut self, caller: &Address) -> Result<ContractEvent, SaleError> {
        self.authorize(caller, "close")?;
        self.gate.close(caller)?;

        info!(
            sale_id = %self.sale_id,
            total_bought = self.total_bought,
            participants = self.participant_count(),
            "Sale intake closed"
        );

        Ok(self.emit(ContractEvent::SaleClosed(SaleClosed {
            sale_id: self.sale_id,
            total_bought: self.total_bought,
        })))
    }

    /// Hand the administrator role to `new_admin`.
    pub fn transfer_admin(&mut self, caller: &Address, new_admin: &Address) -> Result<(), SaleError> {
        self.authorize(caller, "transfer_admin")?;
        self.gate.transfer_admin(caller, new_admin.clone())?;
        info!(sale_id = %self.sale_id, new_admin = %new_admin, "Admin transferred");
        Ok(())
    }

    /// Move collected payment asset to `receiver`. Admin-only, any state.
    pub fn sweep_payment(
        &mut self,
        caller: &Address,
        receiver: &Address,
        amount: u128,
    ) -> Result<ContractEvent, SaleError> {
        self.authorize(caller, "sweep_payment")?;
        self.enter()?;
        let result = self
            .payment
            .transfer(&self.ledger_address, receiver, amount)
            .map_err(SaleError::from);
        self.reentrancy_guard.release();
        result?;

        info!(sale_id = %self.sale_id, receiver = %receiver, amount, "Payment swept");
        Ok(self.emit(ContractEvent::AssetSwept(AssetSwept {
            sale_id: self.sale_id,
            asset: SweptAsset::Payment,
            receiver: receiver.clone(),
            amount,
        })))
    }

    /// Move sale-asset holdings above the outstanding obligation to
    /// `receiver`. Admin-only, any state.
    pub fn sweep_sale_surplus(
        &mut self,
        caller: &Address,
        receiver: &Address,
        amount: u128,
    ) -> Result<ContractEvent, SaleError> {
        self.authorize(caller, "sweep_sale_surplus")?;
        let surplus = self.sale_surplus();
        if amount > surplus {
            return Err(SaleError::InsufficientSupply {
                required: amount,
                available: surplus,
            });
        }

        self.enter()?;
        let result = self
            .sale
            .transfer(&self.ledger_address, receiver, amount)
            .map_err(SaleError::from);
        self.reentrancy_guard.release();
        result?;

        info!(sale_id = %self.sale_id, receiver = %receiver, amount, "Sale surplus swept");
        Ok(self.emit(ContractEvent::AssetSwept(AssetSwept {
            sale_id: self.sale_id,
            asset: SweptAsset::Sale,
            receiver: receiver.clone(),
            amount,
        })))
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Active record for `address`; `None` if unknown or removed.
    pub fn participant(&self, address: &Address) -> Option<&Participant> {
        self.position(address)
            .and_then(|position| self.slots[position].record.as_ref())
    }

    /// Active participants in registration order.
    pub fn participants(&self) -> impl Iterator<Item = (&Address, &Participant)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.record.as_ref().map(|record| (&slot.address, record)))
    }

    /// Number of active participants.
    pub fn participant_count(&self) -> usize {
        self.participants().count()
    }

    /// The full arena including tombstones.
    pub fn slots(&self) -> &[ParticipantSlot] {
        &self.slots
    }

    pub fn total_bought(&self) -> u128 {
        self.total_bought
    }

    pub fn total_sent(&self) -> u128 {
        self.total_sent
    }

    /// Reserved but not yet disbursed, smallest denomination.
    pub fn outstanding_obligation(&self) -> u128 {
        self.total_bought.saturating_sub(self.total_sent)
    }

    /// Sale-asset holdings not needed for outstanding reservations.
    pub fn sale_surplus(&self) -> u128 {
        self.sale
            .balance_of(&self.ledger_address)
            .saturating_sub(self.outstanding_obligation())
    }

    pub fn total_min_buy_allowed(&self) -> u128 {
        self.total_min_buy_allowed
    }

    pub fn total_max_buy_allowed(&self) -> u128 {
        self.total_max_buy_allowed
    }

    pub fn unit_price(&self) -> u128 {
        self.unit_price
    }

    pub fn unit_scale(&self) -> UnitScale {
        self.unit_scale
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    pub fn ledger_address(&self) -> &Address {
        &self.ledger_address
    }

    pub fn admin(&self) -> &Address {
        self.gate.admin()
    }

    pub fn intake_state(&self) -> IntakeState {
        self.gate.state()
    }

    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn schedule(&self) -> &ReleaseSchedule {
        &self.schedule
    }

    pub fn payment_asset(&self) -> &P {
        &self.payment
    }

    pub fn payment_asset_mut(&mut self) -> &mut P {
        &mut self.payment
    }

    pub fn sale_asset(&self) -> &S {
        &self.sale
    }

    pub fn sale_asset_mut(&mut self) -> &mut S {
        &mut self.sale
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: ContractEvent) -> ContractEvent {
        self.events.push(event.clone());
        event
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    pub(crate) fn authorize(&self, caller: &Address, operation: &str) -> Result<(), SaleError> {
        self.gate.require_admin(caller).map_err(|err| {
            warn!(sale_id = %self.sale_id, caller = %caller, operation, "Admin-only call refused");
            err
        })
    }

    pub(crate) fn enter(&mut self) -> Result<(), SaleError> {
        if !self.reentrancy_guard.acquire() {
            debug!(sale_id = %self.sale_id, "Reentrant call rejected");
            return Err(SaleError::Reentrancy);
        }
        Ok(())
    }

    fn position(&self, address: &Address) -> Option<usize> {
        self.index.get(address).copied()
    }
}
