//! Row filtering for result views and exports.

use serde::{Deserialize, Serialize};

use crate::matcher::normalize_vendor;
use crate::model::{MatchOutcome, ReconBucket};

/// All set criteria must hold for a row to pass. An empty filter passes
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultFilter {
    pub bucket: Option<ReconBucket>,
    /// Case-insensitive substring over ids and vendors on both sides.
    pub search: Option<String>,
    /// Vendor substring, compared after normalization.
    pub vendor: Option<String>,
    pub min_amount_cents: Option<i64>,
    pub max_amount_cents: Option<i64>,
}

impl ResultFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, outcome: &MatchOutcome) -> bool {
        if let Some(bucket) = self.bucket {
            if outcome.bucket() != bucket {
                return false;
            }
        }

        let sides = || outcome.record_a().into_iter().chain(outcome.record_b());

        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let hit = sides().any(|r| {
                r.id.to_lowercase().contains(&needle) || r.vendor.to_lowercase().contains(&needle)
            });
            if !hit {
                return false;
            }
        }

        if let Some(vendor) = &self.vendor {
            let wanted = normalize_vendor(vendor);
            if !sides().any(|r| normalize_vendor(&r.vendor).contains(&wanted)) {
                return false;
            }
        }

        // amount range applies to the representative record (A, else B)
        let amount = outcome.primary().amount_cents;
        if self.min_amount_cents.is_some_and(|min| amount < min) {
            return false;
        }
        if self.max_amount_cents.is_some_and(|max| amount > max) {
            return false;
        }

        true
    }

    pub fn apply<'r>(&self, outcomes: &'r [MatchOutcome]) -> Vec<&'r MatchOutcome> {
        outcomes.iter().filter(|o| self.matches(o)).collect()
    }
}
