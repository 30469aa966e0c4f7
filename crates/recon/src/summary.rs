use crate::model::{MatchOutcome, ReconBucket, ReconSummary};

/// Round to `places` decimals, for percentages shown to operators.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Compute summary statistics from match outcomes.
pub fn compute_summary(outcomes: &[MatchOutcome]) -> ReconSummary {
    let mut matched = 0;
    let mut discrepant = 0;
    let mut unmatched_a = 0;
    let mut unmatched_b = 0;
    let mut total_variance_cents: i64 = 0;

    for o in outcomes {
        match o.bucket() {
            ReconBucket::Matched => matched += 1,
            ReconBucket::Discrepant => discrepant += 1,
            ReconBucket::UnmatchedA => unmatched_a += 1,
            ReconBucket::UnmatchedB => unmatched_b += 1,
        }
        if o.bucket() != ReconBucket::Matched {
            total_variance_cents = total_variance_cents.saturating_add(o.variance_cents());
        }
    }

    let pairs = matched + discrepant;
    let total_records = pairs * 2 + unmatched_a + unmatched_b;
    let outcome_rows = outcomes.len();

    ReconSummary {
        total_records,
        outcome_rows,
        matched,
        discrepant,
        unmatched_a,
        unmatched_b,
        matched_pct: round_to(pct(matched, outcome_rows), 2),
        discrepant_pct: round_to(pct(discrepant, outcome_rows), 2),
        unmatched_pct: round_to(pct(unmatched_a + unmatched_b, total_records), 2),
        total_variance_cents,
    }
}
