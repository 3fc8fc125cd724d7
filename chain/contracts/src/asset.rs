//! Asset accounts: the transferable-token interface the ledger moves
//! value through
//!
//! The ledger holds two asset accounts: the payment asset participants pay
//! with and the sale asset it disburses. Both are reached only through the
//! `AssetAccount` trait; every mutating call is a fallible, untrusted
//! boundary.
//!
//! `InMemoryAsset` is a host-side reference ledger with balances and
//! allowances, suitable for embedding and for tests.

use sale_types::ids::Address;
use std::collections::HashMap;

use crate::errors::AssetError;

/// Transferable asset ledger as seen by the sale.
///
/// All amounts are smallest-denomination integers.
pub trait AssetAccount {
    /// Balance held by `owner`.
    fn balance_of(&self, owner: &Address) -> u128;

    /// Amount `spender` may still pull from `owner`.
    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// Move `amount` from `from` to `to`, authorized by `from`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), AssetError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), AssetError>;
}

/// In-memory asset ledger.
///
/// Balances are stored as `HashMap<Address, u128>` and allowances keyed by
/// `(owner, spender)`.
#[derive(Debug, Clone)]
pub struct InMemoryAsset {
    symbol: String,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
}

impl InMemoryAsset {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Create `amount` out of thin air for `to`.
    pub fn mint(&mut self, to: &Address, amount: u128) -> Result<(), AssetError> {
        self.safe_credit(to, amount)
    }

    /// Set the allowance `spender` may pull from `owner`.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> u128 {
        self.balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }

    // ───────────────────────── Safe Transfer ─────────────────────────

    /// Internal credit with overflow protection.
    fn safe_credit(&mut self, owner: &Address, amount: u128) -> Result<(), AssetError> {
        let current = self.balances.entry(owner.clone()).or_insert(0);
        *current = current.checked_add(amount).ok_or_else(|| AssetError::Overflow {
            asset: self.symbol.clone(),
        })?;
        Ok(())
    }

    /// Internal debit with underflow protection.
    fn safe_debit(&mut self, owner: &Address, amount: u128) -> Result<(), AssetError> {
        let available = self.balance_of(owner);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                asset: self.symbol.clone(),
                required: amount,
                available,
            });
        }
        self.balances.insert(owner.clone(), available - amount);
        Ok(())
    }

    /// Debit then credit; the credit side is checked before anything moves.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), AssetError> {
        if from == to {
            let available = self.balance_of(from);
            if available < amount {
                return Err(AssetError::InsufficientBalance {
                    asset: self.symbol.clone(),
                    required: amount,
                    available,
                });
            }
            return Ok(());
        }
        self.balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| AssetError::Overflow {
                asset: self.symbol.clone(),
            })?;
        self.safe_debit(from, amount)?;
        self.safe_credit(to, amount)
    }
}

impl AssetAccount for InMemoryAsset {
    fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), AssetError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), AssetError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(AssetError::InsufficientAllowance {
                asset: self.symbol.clone(),
                required: amount,
                approved,
            });
        }
        self.move_balance(from, to, amount)?;
        self.allowances
            .insert((from.clone(), spender.clone()), approved - amount);
        Ok(())
    }
}
