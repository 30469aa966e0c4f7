// Property-based tests for the matcher and summary.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use pairwise_recon::config::ReconConfig;
use pairwise_recon::model::{Field, MatchOutcome};
use pairwise_recon::{run, MatchResult, ReconInput, Record, Source, ToleranceConfig};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const VENDORS: [&str; 3] = ["Acme", "Beta", "Gamma"];

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// (vendor index, day offset, amount cents)
fn arb_fields() -> impl Strategy<Value = (usize, i64, i64)> {
    (0..VENDORS.len(), 0i64..20, 100i64..10_000)
}

fn build(source: Source, prefix: &str, fields: Vec<(usize, i64, i64)>) -> Vec<Record> {
    fields
        .into_iter()
        .enumerate()
        .map(|(i, (v, day, cents))| {
            Record::new(
                source,
                format!("{prefix}{i:03}"),
                VENDORS[v],
                base_date() + Duration::days(day),
                cents,
            )
        })
        .collect()
}

fn arb_input() -> impl Strategy<Value = ReconInput> {
    (
        prop::collection::vec(arb_fields(), 1..12),
        prop::collection::vec(arb_fields(), 0..12),
    )
        .prop_map(|(a, b)| ReconInput::new(build(Source::A, "A", a), build(Source::B, "B", b)))
}

/// One A record per vendor, so A records never compete for the same B.
fn arb_isolated_input() -> impl Strategy<Value = ReconInput> {
    (
        prop::collection::vec((0i64..20, 100i64..10_000), 1..6),
        prop::collection::vec((0..6usize, 0i64..20, 100i64..10_000), 0..15),
    )
        .prop_map(|(a, b)| {
            let vendor = |i: usize| format!("Vendor {i}");
            let records_a = a
                .into_iter()
                .enumerate()
                .map(|(i, (day, cents))| {
                    Record::new(Source::A, format!("A{i:03}"), vendor(i), base_date() + Duration::days(day), cents)
                })
                .collect();
            let records_b = b
                .into_iter()
                .enumerate()
                .map(|(i, (v, day, cents))| {
                    Record::new(Source::B, format!("B{i:03}"), vendor(v), base_date() + Duration::days(day), cents)
                })
                .collect();
            ReconInput::new(records_a, records_b)
        })
}

fn arb_tolerance_pair() -> impl Strategy<Value = (f64, f64)> {
    (0.0..20.0f64, 0.0..20.0f64).prop_map(|(x, y)| if x <= y { (x, y) } else { (y, x) })
}

fn run_with(input: &ReconInput, amount_pct: f64, date_days: u32) -> MatchResult {
    let mut config = ReconConfig::default();
    config.tolerance = ToleranceConfig::new(amount_pct, date_days).unwrap();
    run(&config, input).unwrap().result
}

fn matched_a(result: &MatchResult) -> BTreeSet<String> {
    result.pairs().map(|p| p.record_a.id.clone()).collect()
}

fn pairing(result: &MatchResult) -> BTreeMap<String, String> {
    result
        .pairs()
        .map(|p| (p.record_a.id.clone(), p.record_b.id.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// Every input record shows up in exactly one outcome row.
    #[test]
    fn coverage(input in arb_input(), pct in 0.0..15.0f64, days in 0u32..5) {
        let result = run_with(&input, pct, days);

        let mut a_ids: Vec<&str> = result.outcomes.iter().filter_map(|o| o.record_a()).map(|r| r.id.as_str()).collect();
        let mut b_ids: Vec<&str> = result.outcomes.iter().filter_map(|o| o.record_b()).map(|r| r.id.as_str()).collect();
        a_ids.sort_unstable();
        b_ids.sort_unstable();
        let want_a: Vec<&str> = input.records_a.iter().map(|r| r.id.as_str()).collect();
        let want_b: Vec<&str> = input.records_b.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(a_ids, want_a);
        prop_assert_eq!(b_ids, want_b);

        let s = &result.summary;
        prop_assert_eq!(s.matched + s.discrepant + s.unmatched_a + s.unmatched_b, result.outcomes.len());
        prop_assert_eq!(s.total_records, input.total_records());
    }

    /// Same inputs, same tolerance, same result.
    #[test]
    fn idempotent(input in arb_input(), pct in 0.0..15.0f64, days in 0u32..5) {
        prop_assert_eq!(run_with(&input, pct, days), run_with(&input, pct, days));
    }

    /// Matched pairs respect the tolerance and carry exactly the flags for
    /// fields that differ.
    #[test]
    fn pairs_within_tolerance(input in arb_input(), pct in 0.0..15.0f64, days in 0u32..5) {
        let result = run_with(&input, pct, days);
        let t = result.tolerance;
        for pair in result.pairs() {
            let (a, b) = (&pair.record_a, &pair.record_b);
            prop_assert_eq!(&a.vendor, &b.vendor);
            prop_assert!(t.amount_within(a.amount_cents, b.amount_cents));
            prop_assert!(t.date_within(a.date, b.date));
            prop_assert_eq!(pair.discrepancies.contains(&Field::Amount), a.amount_cents != b.amount_cents);
            prop_assert_eq!(pair.discrepancies.contains(&Field::Date), a.date != b.date);
            prop_assert!(!pair.discrepancies.contains(&Field::Vendor));
        }
    }

    /// Widening the amount tolerance never loses a match.
    #[test]
    fn amount_monotonic(input in arb_isolated_input(), (lo, hi) in arb_tolerance_pair(), days in 0u32..5) {
        let narrow = matched_a(&run_with(&input, lo, days));
        let wide = matched_a(&run_with(&input, hi, days));
        prop_assert!(narrow.is_subset(&wide), "narrow {:?} wide {:?}", narrow, wide);
    }

    /// Widening the date window never loses a match.
    #[test]
    fn date_monotonic(input in arb_isolated_input(), pct in 0.0..15.0f64, lo in 0u32..5, extra in 0u32..5) {
        let narrow = matched_a(&run_with(&input, pct, lo));
        let wide = matched_a(&run_with(&input, pct, lo + extra));
        prop_assert!(narrow.is_subset(&wide), "narrow {:?} wide {:?}", narrow, wide);
    }

    /// With the default lowest-id tie-break, B input order does not change
    /// which B record each A record pairs with.
    #[test]
    fn b_order_independent(
        (input, shuffled) in arb_input().prop_flat_map(|input| {
            let b = input.records_b.clone();
            (Just(input), Just(b).prop_shuffle())
        }),
        pct in 0.0..15.0f64,
        days in 0u32..5,
    ) {
        let permuted = ReconInput::new(input.records_a.clone(), shuffled);
        let original = run_with(&input, pct, days);
        let reordered = run_with(&permuted, pct, days);
        prop_assert_eq!(pairing(&original), pairing(&reordered));

        let unmatched_b = |r: &MatchResult| -> BTreeSet<String> {
            r.outcomes
                .iter()
                .filter_map(|o| match o {
                    MatchOutcome::UnmatchedB { record } => Some(record.id.clone()),
                    _ => None,
                })
                .collect()
        };
        prop_assert_eq!(unmatched_b(&original), unmatched_b(&reordered));
    }
}
