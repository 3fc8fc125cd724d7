//! Participant record for a limited sale
//!
//! Bounds and reservations are whole sale-asset units; `sent` is counted in
//! the smallest denomination. The record upholds
//! `sent <= reserved * unit_scale` at all times.

use serde::{Deserialize, Serialize};

use crate::errors::NumericError;
use crate::numeric::UnitScale;

/// Per-address purchase bounds and disbursement progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participant {
    /// Inclusive lower bound on total reservable whole units
    pub min_buy_allowed: u128,
    /// Inclusive upper bound on total reservable whole units
    pub max_buy_allowed: u128,
    /// Cumulative whole units reserved
    pub reserved: u128,
    /// Cumulative smallest-denomination units already disbursed
    pub sent: u128,
}

impl Participant {
    /// Fresh participant with the given bounds and nothing reserved.
    pub fn new(min_buy_allowed: u128, max_buy_allowed: u128) -> Self {
        Self {
            min_buy_allowed,
            max_buy_allowed,
            reserved: 0,
            sent: 0,
        }
    }

    /// Whether any whole units have been reserved.
    pub fn has_reservation(&self) -> bool {
        self.reserved > 0
    }

    /// Reservation expressed in smallest denomination.
    pub fn reserved_base(&self, scale: UnitScale) -> Result<u128, NumericError> {
        scale.to_base(self.reserved)
    }

    /// Smallest-denomination units reserved but not yet disbursed.
    pub fn locked_left(&self, scale: UnitScale) -> Result<u128, NumericError> {
        Ok(self.reserved_base(scale)?.saturating_sub(self.sent))
    }

    /// True once every reserved unit has been disbursed.
    pub fn is_fully_released(&self, scale: UnitScale) -> Result<bool, NumericError> {
        Ok(self.locked_left(scale)? == 0)
    }
}
