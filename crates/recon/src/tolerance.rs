//! Tolerance configuration: how far two records may drift and still match.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

pub const DEFAULT_AMOUNT_TOLERANCE_PERCENT: f64 = 5.0;
pub const DEFAULT_DATE_TOLERANCE_DAYS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Relative amount tolerance, in percent of the larger absolute amount.
    pub amount_tolerance_percent: f64,
    /// Symmetric, inclusive date window.
    pub date_tolerance_days: u32,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            amount_tolerance_percent: DEFAULT_AMOUNT_TOLERANCE_PERCENT,
            date_tolerance_days: DEFAULT_DATE_TOLERANCE_DAYS,
        }
    }
}

impl ToleranceConfig {
    pub fn new(amount_tolerance_percent: f64, date_tolerance_days: u32) -> Result<Self, ReconError> {
        let config = Self { amount_tolerance_percent, date_tolerance_days };
        config.validate()?;
        Ok(config)
    }

    /// Build from operator input where the day count may arrive signed.
    pub fn from_raw(amount_tolerance_percent: f64, date_tolerance_days: i64) -> Result<Self, ReconError> {
        let days = u32::try_from(date_tolerance_days).map_err(|_| {
            ReconError::InvalidTolerance(format!(
                "date tolerance must be a non-negative day count, got {date_tolerance_days}"
            ))
        })?;
        Self::new(amount_tolerance_percent, days)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let pct = self.amount_tolerance_percent;
        if !pct.is_finite() {
            return Err(ReconError::InvalidTolerance(format!(
                "amount tolerance must be finite, got {pct}"
            )));
        }
        if pct < 0.0 {
            return Err(ReconError::InvalidTolerance(format!(
                "amount tolerance must be non-negative, got {pct}"
            )));
        }
        Ok(())
    }

    /// `|a - b| <= pct/100 * max(|a|, |b|)`, evaluated as
    /// `100 * |a - b| <= pct * max(|a|, |b|)` to keep whole-percent
    /// boundaries exact.
    pub fn amount_within(&self, a_cents: i64, b_cents: i64) -> bool {
        let diff = (i128::from(a_cents) - i128::from(b_cents)).unsigned_abs() as f64;
        let base = a_cents.unsigned_abs().max(b_cents.unsigned_abs()) as f64;
        diff * 100.0 <= self.amount_tolerance_percent * base
    }

    pub fn date_within(&self, a: NaiveDate, b: NaiveDate) -> bool {
        (a - b).num_days().unsigned_abs() <= u64::from(self.date_tolerance_days)
    }
}

/// The operator's current tolerance plus a dirty flag.
///
/// Any successful `set` marks the settings dirty: results computed under the
/// previous values are stale until the next run consumes the new ones.
#[derive(Debug, Clone)]
pub struct ToleranceSettings {
    current: ToleranceConfig,
    dirty: bool,
    revision: u64,
}

impl Default for ToleranceSettings {
    fn default() -> Self {
        Self::new(ToleranceConfig::default())
    }
}

impl ToleranceSettings {
    /// A fresh configuration has never been applied, so it starts dirty.
    pub fn new(initial: ToleranceConfig) -> Self {
        Self { current: initial, dirty: true, revision: 0 }
    }

    pub fn get(&self) -> ToleranceConfig {
        self.current
    }

    pub fn set(&mut self, new: ToleranceConfig) -> Result<(), ReconError> {
        new.validate()?;
        log::debug!(
            "tolerance set: amount {}% date {}d",
            new.amount_tolerance_percent,
            new.date_tolerance_days
        );
        self.current = new;
        self.dirty = true;
        self.revision += 1;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bumped on every successful `set`.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Install a value that a run has already validated and consumed.
    pub(crate) fn adopt(&mut self, applied: ToleranceConfig) {
        self.current = applied;
        self.dirty = false;
        self.revision += 1;
    }

    /// Clear the dirty flag if `applied` is still the current value.
    /// A mutation queued while the run was in flight keeps the flag set.
    pub(crate) fn mark_applied(&mut self, applied: &ToleranceConfig) {
        if self.current == *applied {
            self.dirty = false;
        }
    }
}
