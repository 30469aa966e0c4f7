//! Greedy best-candidate matching of A records against B records.
//!
//! A records are processed in input order; each takes the best-scoring B
//! record still in the pool. This is deliberately not an optimal bipartite
//! assignment: an earlier A record can take a B record that a later one
//! needed more. The result depends only on A order, the B set and the
//! tolerance snapshot.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::TieBreak;
use crate::model::{Field, MatchOutcome, MatchedPair, Record};
use crate::tolerance::ToleranceConfig;

/// Trim, collapse inner whitespace, lowercase.
pub fn normalize_vendor(vendor: &str) -> String {
    vendor.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// A B record that satisfies every match criterion for some A record.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    index: usize,
    record: &'a Record,
    exact_amount: bool,
    exact_date: bool,
    distance: f64,
}

impl Candidate<'_> {
    /// `Less` means `self` is the better candidate.
    fn rank(&self, other: &Candidate<'_>, tie_break: TieBreak) -> Ordering {
        other
            .exact_amount
            .cmp(&self.exact_amount)
            .then_with(|| other.exact_date.cmp(&self.exact_date))
            .then_with(|| self.distance.total_cmp(&other.distance))
            .then_with(|| match tie_break {
                TieBreak::LowestId => self.record.id.cmp(&other.record.id),
                TieBreak::InputOrder => Ordering::Equal,
            })
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Combined normalized distance: relative amount gap plus date gap as a
/// fraction of the window.
fn distance(a: &Record, b: &Record, tolerance: &ToleranceConfig) -> f64 {
    let diff = (i128::from(a.amount_cents) - i128::from(b.amount_cents)).unsigned_abs() as f64;
    let base = if a.amount_cents != 0 {
        a.amount_cents.unsigned_abs()
    } else {
        b.amount_cents.unsigned_abs()
    };
    let amount_term = if base == 0 { 0.0 } else { diff / base as f64 };

    let days = (a.date - b.date).num_days().unsigned_abs() as f64;
    let window = f64::from(tolerance.date_tolerance_days.max(1));

    amount_term + days / window
}

/// Date and amount criteria. Vendor equality is checked by the caller.
fn candidate<'b>(
    a: &Record,
    index: usize,
    b: &'b Record,
    tolerance: &ToleranceConfig,
) -> Option<Candidate<'b>> {
    if !tolerance.date_within(a.date, b.date) {
        return None;
    }
    if !tolerance.amount_within(a.amount_cents, b.amount_cents) {
        return None;
    }
    Some(Candidate {
        index,
        record: b,
        exact_amount: a.amount_cents == b.amount_cents,
        exact_date: a.date == b.date,
        distance: distance(a, b, tolerance),
    })
}

/// Fields on which a matched pair is not identical.
///
/// Vendor strings differing only in case or whitespace are treated as equal.
pub fn annotate_discrepancies(a: &Record, b: &Record) -> BTreeSet<Field> {
    let mut fields = BTreeSet::new();
    if normalize_vendor(&a.vendor) != normalize_vendor(&b.vendor) {
        fields.insert(Field::Vendor);
    }
    if a.date != b.date {
        fields.insert(Field::Date);
    }
    if a.amount_cents != b.amount_cents {
        fields.insert(Field::Amount);
    }
    fields
}

/// Pair `records_a` with `records_b` under `tolerance`.
///
/// Output order: one row per A record in A input order (matched or
/// unmatched), followed by the leftover B records in B input order.
pub fn match_records(
    records_a: &[Record],
    records_b: &[Record],
    tolerance: &ToleranceConfig,
    tie_break: TieBreak,
) -> Vec<MatchOutcome> {
    let b_vendors: Vec<String> = records_b.iter().map(|b| normalize_vendor(&b.vendor)).collect();
    let mut b_used = vec![false; records_b.len()];
    let mut outcomes = Vec::with_capacity(records_a.len() + records_b.len());

    for a in records_a {
        let a_vendor = normalize_vendor(&a.vendor);
        let mut best: Option<Candidate<'_>> = None;

        for (bi, b) in records_b.iter().enumerate() {
            if b_used[bi] || b_vendors[bi] != a_vendor {
                continue;
            }
            let Some(c) = candidate(a, bi, b, tolerance) else {
                continue;
            };
            best = match best {
                Some(current) if current.rank(&c, tie_break) != Ordering::Greater => Some(current),
                _ => Some(c),
            };
        }

        match best {
            Some(c) => {
                b_used[c.index] = true;
                let b = c.record;
                outcomes.push(MatchOutcome::Matched(MatchedPair {
                    record_a: a.clone(),
                    record_b: b.clone(),
                    discrepancies: annotate_discrepancies(a, b),
                    delta_cents: b.amount_cents.saturating_sub(a.amount_cents),
                    date_offset_days: (b.date - a.date).num_days(),
                }));
            }
            None => outcomes.push(MatchOutcome::UnmatchedA { record: a.clone() }),
        }
    }

    outcomes.extend(
        records_b
            .iter()
            .zip(&b_used)
            .filter(|(_, used)| !**used)
            .map(|(b, _)| MatchOutcome::UnmatchedB { record: b.clone() }),
    );

    log::debug!(
        "matched {} A against {} B: {} rows",
        records_a.len(),
        records_b.len(),
        outcomes.len()
    );

    outcomes
}
