//! Amount scaling between whole units and smallest denomination
//!
//! Participant bounds and reservations are counted in whole sale-asset
//! units; holdings and disbursements are counted in the smallest
//! denomination. `UnitScale` is the only bridge between the two.
//!
//! All accounting is exact `u128` integer arithmetic. `to_decimal` exists
//! for logs and display and never feeds back into accounting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::NumericError;

/// Largest decimal precision whose scale factor fits in a `u128`.
pub const MAX_DECIMALS: u32 = 38;

/// Smallest-denomination multiplier for an asset (`10^decimals`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct UnitScale {
    decimals: u32,
    factor: u128,
}

impl UnitScale {
    /// Build the scale for an asset with `decimals` digits of precision.
    pub fn from_decimals(decimals: u32) -> Result<Self, NumericError> {
        if decimals > MAX_DECIMALS {
            return Err(NumericError::UnsupportedDecimals {
                decimals,
                max: MAX_DECIMALS,
            });
        }
        Ok(Self {
            decimals,
            factor: 10u128.pow(decimals),
        })
    }

    /// Number of decimal digits.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// The multiplier itself.
    pub fn factor(&self) -> u128 {
        self.factor
    }

    /// Convert whole units to smallest denomination.
    pub fn to_base(&self, units: u128) -> Result<u128, NumericError> {
        units
            .checked_mul(self.factor)
            .ok_or(NumericError::Overflow { units })
    }

    /// Render a smallest-denomination amount in whole units.
    pub fn to_decimal(&self, amount: u128) -> Option<Decimal> {
        to_decimal(amount, self.decimals)
    }
}

impl TryFrom<u32> for UnitScale {
    type Error = NumericError;

    fn try_from(decimals: u32) -> Result<Self, Self::Error> {
        Self::from_decimals(decimals)
    }
}

impl From<UnitScale> for u32 {
    fn from(scale: UnitScale) -> Self {
        scale.decimals
    }
}

/// Render `amount` (smallest denomination) as a decimal with `decimals`
/// fractional digits.
///
/// Returns `None` when the value exceeds `Decimal`'s 96-bit mantissa or
/// 28-digit scale.
pub fn to_decimal(amount: u128, decimals: u32) -> Option<Decimal> {
    let mantissa = i128::try_from(amount).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, decimals).ok()
}
