//! Contract-specific error types
//!
//! Every variant except `InternalInsufficientSupply` is a refusal: the call
//! is rejected and no ledger state changes.

use sale_types::errors::NumericError;
use thiserror::Error;

/// Which participant bound a reservation would breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Reservation would exceed `max_buy_allowed`
    BuyHigh,
    /// Reservation total would stay under `min_buy_allowed`
    BelowMinimum,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::BuyHigh => write!(f, "buy-high"),
            LimitKind::BelowMinimum => write!(f, "below-minimum"),
        }
    }
}

/// Why a release attempt came too early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingKind {
    /// Current time is before the initial release date
    BeforeInitialDate { available_at: i64 },
    /// The release interval since the previous stage has not elapsed
    IntervalNotElapsed { available_at: i64 },
}

impl std::fmt::Display for TimingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimingKind::BeforeInitialDate { available_at } => {
                write!(f, "initial release date not reached (available at {available_at})")
            }
            TimingKind::IntervalNotElapsed { available_at } => {
                write!(f, "release interval not elapsed (available at {available_at})")
            }
        }
    }
}

/// Asset account errors raised by an `AssetAccount` implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Insufficient {asset} balance: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: u128,
        available: u128,
    },

    #[error("Insufficient {asset} allowance: required {required}, approved {approved}")]
    InsufficientAllowance {
        asset: String,
        required: u128,
        approved: u128,
    },

    #[error("Arithmetic overflow in {asset} balance")]
    Overflow { asset: String },

    #[error("Transfer rejected by {asset}: {reason}")]
    Rejected { asset: String, reason: String },
}

/// Sale ledger and release scheduler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaleError {
    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Invalid state: {0}")]
    StateError(String),

    #[error("Insufficient supply: required {required}, available {available}")]
    InsufficientSupply { required: u128, available: u128 },

    #[error("Limit exceeded: {0}")]
    LimitExceeded(LimitKind),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u128, available: u128 },

    #[error("Insufficient authorization: required {required}, approved {approved}")]
    InsufficientAuthorization { required: u128, approved: u128 },

    #[error("Timing error: {0}")]
    TimingError(TimingKind),

    #[error("Internal insufficient supply: scheduled {required}, holdings {available}")]
    InternalInsufficientSupply { required: u128, available: u128 },

    #[error("Releases halted after a funding failure")]
    ReleasesHalted,

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Invalid bounds: min {min} exceeds max {max}")]
    InvalidBounds { min: u128, max: u128 },

    #[error("Invalid release interval: {0}")]
    InvalidInterval(i64),

    #[error("Invalid release count: total_releases must be at least 1")]
    InvalidReleaseCount,

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Arithmetic overflow in ledger calculation")]
    Overflow,

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Ledger lock poisoned")]
    LockPoisoned,
}

impl SaleError {
    /// Fatal errors signal an operational fault rather than a usage error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SaleError::InternalInsufficientSupply { .. })
    }

    pub(crate) fn state(message: &str) -> Self {
        SaleError::StateError(message.to_string())
    }
}

impl From<NumericError> for SaleError {
    fn from(_: NumericError) -> Self {
        SaleError::Overflow
    }
}

/// Sale configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Malformed config: {0}")]
    Malformed(String),

    #[error("total_releases must be at least 1")]
    ZeroReleases,

    #[error("release_interval must not be negative: {0}")]
    NegativeInterval(i64),

    #[error("unit_price must be positive")]
    ZeroPrice,

    #[error("Unsupported sale decimals: {0}")]
    UnsupportedDecimals(u32),

    #[error("Participant {address}: min {min} exceeds max {max}")]
    InvalidBounds { address: String, min: u128, max: u128 },

    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(String),

    #[error("Sale error while applying config: {0}")]
    Sale(#[from] SaleError),
}
