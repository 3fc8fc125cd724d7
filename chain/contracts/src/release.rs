//! Release Scheduler: staged disbursement of reserved sale tokens
//!
//! After intake closes the administrator triggers releases repeatedly.
//! Each successful call advances the stage counter by exactly one and pays
//! every participant `reserved * unit_scale / total_releases` (truncated),
//! capped at what is left. From stage `total_releases` on, every remainder
//! is flushed, so full payout is reached exactly at that stage. Calls past
//! the last stage keep succeeding and pay nothing once everything is out.
//!
//! A call is planned completely against a running copy of the ledger's
//! sale-asset holdings before any counter moves. A shortfall is fatal:
//! nothing is paid and releases stay halted until the administrator
//! resumes them.

use sale_types::ids::Address;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::asset::AssetAccount;
use crate::errors::{SaleError, TimingKind};
use crate::events::{ContractEvent, ReleaseFinished};
use crate::ledger::SaleLedger;

/// Release timing and progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSchedule {
    /// Unix seconds after which releases are permitted
    init_release_date: i64,
    /// Minimum spacing between releases, seconds
    release_interval: i64,
    /// Stage at which full payout is reached
    total_releases: u64,
    /// Stages executed so far
    current_release: u64,
    /// Set after a fatal funding failure
    halted: bool,
}

impl ReleaseSchedule {
    pub fn new(
        init_release_date: i64,
        release_interval: i64,
        total_releases: u64,
    ) -> Result<Self, SaleError> {
        let schedule = Self {
            init_release_date,
            release_interval,
            total_releases,
            current_release: 0,
            halted: false,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Parameter checks shared by construction and snapshot restore.
    pub(crate) fn validate(&self) -> Result<(), SaleError> {
        if self.release_interval < 0 {
            return Err(SaleError::InvalidInterval(self.release_interval));
        }
        if self.total_releases == 0 {
            return Err(SaleError::InvalidReleaseCount);
        }
        Ok(())
    }

    pub fn init_release_date(&self) -> i64 {
        self.init_release_date
    }

    pub fn release_interval(&self) -> i64 {
        self.release_interval
    }

    pub fn total_releases(&self) -> u64 {
        self.total_releases
    }

    pub fn current_release(&self) -> u64 {
        self.current_release
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// True once the full-payout stage has run.
    pub fn is_complete(&self) -> bool {
        self.current_release >= self.total_releases
    }

    /// Earliest instant the next release may run.
    pub fn next_release_at(&self) -> Result<i64, SaleError> {
        let stages = i64::try_from(self.current_release).map_err(|_| SaleError::Overflow)?;
        stages
            .checked_mul(self.release_interval)
            .and_then(|offset| self.init_release_date.checked_add(offset))
            .ok_or(SaleError::Overflow)
    }

    /// Refuse a release attempted at `now` if it is too early.
    ///
    /// The interval check uses the stage count before this release.
    pub fn check_due(&self, now: i64) -> Result<(), SaleError> {
        if now < self.init_release_date {
            return Err(SaleError::TimingError(TimingKind::BeforeInitialDate {
                available_at: self.init_release_date,
            }));
        }
        let available_at = self.next_release_at()?;
        if now < available_at {
            return Err(SaleError::TimingError(TimingKind::IntervalNotElapsed {
                available_at,
            }));
        }
        Ok(())
    }

    /// Disbursement for one participant at `stage` (the post-increment
    /// stage number).
    ///
    /// From the last stage on the whole remainder is paid; no single
    /// release ever pays more than `locked_left`.
    pub fn round_amount(&self, reserved_base: u128, locked_left: u128, stage: u64) -> u128 {
        let round = reserved_base / u128::from(self.total_releases);
        if (stage >= self.total_releases && round != locked_left) || round > locked_left {
            return locked_left;
        }
        round
    }

    pub(crate) fn set_interval(&mut self, release_interval: i64) {
        self.release_interval = release_interval;
    }
}

impl<P: AssetAccount, S: AssetAccount> SaleLedger<P, S> {
    /// Run the next release stage at `now`. Admin-only, intake closed.
    ///
    /// Returns the total smallest-denomination amount disbursed. A call with
    /// nothing left to pay still advances the stage and returns zero.
    ///
    /// Only the funding check is all-or-nothing. If an asset transfer fails
    /// during the commit, the stage still counts, participants paid earlier
    /// in the stage keep their payments, the failing one is rolled back and
    /// releases are halted. Later stages flush whatever is left.
    pub fn release_tokens(&mut self, caller: &Address, now: i64) -> Result<u128, SaleError> {
        self.authorize(caller, "release_tokens")?;
        self.gate.require_closed()?;
        if self.schedule.halted {
            return Err(SaleError::ReleasesHalted);
        }
        self.enter()?;
        let result = self.release_tokens_inner(now);
        self.reentrancy_guard.release();
        result
    }

    fn release_tokens_inner(&mut self, now: i64) -> Result<u128, SaleError> {
        self.schedule.check_due(now)?;
        let stage = self
            .schedule
            .current_release
            .checked_add(1)
            .ok_or(SaleError::Overflow)?;

        let plan = self.plan_release(stage)?;

        // Effects, then one interaction per participant
        self.schedule.current_release = stage;
        let mut tokens_sent: u128 = 0;
        for (position, amount) in plan {
            let recipient = self.slots[position].address.clone();
            self.record_sent(position, amount, true);

            if let Err(err) = self.sale.transfer(&self.ledger_address, &recipient, amount) {
                self.record_sent(position, amount, false);
                self.schedule.halted = true;
                error!(
                    sale_id = %self.sale_id,
                    stage,
                    participant = %recipient,
                    amount,
                    error = %err,
                    "Release transfer failed; releases halted"
                );
                return Err(err.into());
            }

            tokens_sent += amount;
            debug!(
                sale_id = %self.sale_id,
                stage,
                participant = %recipient,
                amount,
                "Release disbursed"
            );
        }

        info!(
            sale_id = %self.sale_id,
            stage = stage - 1,
            tokens_sent,
            "Release finished"
        );

        self.emit(ContractEvent::ReleaseFinished(ReleaseFinished {
            sale_id: self.sale_id,
            stage: stage - 1,
            tokens_sent,
        }));
        Ok(tokens_sent)
    }

    /// Compute every disbursement of `stage` in iteration order without
    /// mutating anything except the halt flag on a shortfall.
    fn plan_release(&mut self, stage: u64) -> Result<Vec<(usize, u128)>, SaleError> {
        let mut available = self.sale.balance_of(&self.ledger_address);
        let mut plan = Vec::new();

        for (position, slot) in self.slots.iter().enumerate() {
            let Some(record) = slot.record.as_ref() else {
                continue;
            };
            if !record.has_reservation() {
                continue;
            }
            let reserved_base = record.reserved_base(self.unit_scale)?;
            let locked_left = reserved_base.saturating_sub(record.sent);
            if locked_left == 0 {
                continue;
            }

            let amount = self.schedule.round_amount(reserved_base, locked_left, stage);
            if amount > available {
                let err = SaleError::InternalInsufficientSupply {
                    required: amount,
                    available,
                };
                error!(
                    sale_id = %self.sale_id,
                    stage,
                    participant = %slot.address,
                    required = amount,
                    available,
                    "Scheduled release exceeds holdings; releases halted"
                );
                self.schedule.halted = true;
                return Err(err);
            }
            if amount == 0 {
                continue;
            }
            available -= amount;
            plan.push((position, amount));
        }

        Ok(plan)
    }

    fn record_sent(&mut self, position: usize, amount: u128, credit: bool) {
        if let Some(record) = self.slots[position].record.as_mut() {
            if credit {
                record.sent += amount;
                self.total_sent += amount;
            } else {
                record.sent -= amount;
                self.total_sent -= amount;
            }
        }
    }

    /// Change the spacing between releases. Admin-only, intake open.
    pub fn set_release_interval(&mut self, caller: &Address, release_interval: i64) -> Result<(), SaleError> {
        self.authorize(caller, "set_release_interval")?;
        self.gate.require_open()?;
        if release_interval < 0 {
            return Err(SaleError::InvalidInterval(release_interval));
        }
        self.schedule.set_interval(release_interval);
        info!(sale_id = %self.sale_id, release_interval, "Release interval updated");
        Ok(())
    }

    /// Clear the halt flag after the holdings have been topped up. Admin-only.
    pub fn resume_releases(&mut self, caller: &Address) -> Result<(), SaleError> {
        self.authorize(caller, "resume_releases")?;
        if !self.schedule.halted {
            return Err(SaleError::state("releases are not halted"));
        }
        self.schedule.halted = false;
        info!(sale_id = %self.sale_id, "Releases resumed");
        Ok(())
    }
}
