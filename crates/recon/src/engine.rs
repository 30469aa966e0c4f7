use std::collections::HashSet;

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::insights::generate_insights;
use crate::matcher::match_records;
use crate::model::{MatchResult, ReconInput, ReconMeta, ReconSnapshot, Record, Source};
use crate::summary::compute_summary;

/// Check one side against the input contract.
pub fn validate_records(expected: Source, records: &[Record]) -> Result<(), ReconError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());

    for (i, r) in records.iter().enumerate() {
        let invalid = |reason: String| ReconError::InvalidRecord {
            source_set: expected.to_string(),
            record_id: if r.id.is_empty() { format!("#{}", i + 1) } else { r.id.clone() },
            reason,
        };

        if r.source != expected {
            return Err(invalid(format!("tagged with source {}", r.source)));
        }
        if r.id.trim().is_empty() {
            return Err(invalid("empty id".into()));
        }
        if r.vendor.trim().is_empty() {
            return Err(invalid("empty vendor".into()));
        }
        if r.amount_cents == i64::MIN {
            return Err(invalid("amount out of range".into()));
        }
        if !seen.insert(r.id.as_str()) {
            return Err(invalid("duplicate id".into()));
        }
    }

    Ok(())
}

/// Run reconciliation per config. Returns match result + insights.
///
/// Pure: nothing outside the returned snapshot is touched.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconSnapshot, ReconError> {
    config.tolerance.validate()?;

    if input.records_a.is_empty() && input.records_b.is_empty() {
        return Err(ReconError::EmptyInput);
    }
    validate_records(Source::A, &input.records_a)?;
    validate_records(Source::B, &input.records_b)?;

    let tolerance = config.tolerance;
    log::debug!(
        "reconciling {} A / {} B records (amount {}%, date {}d, tie-break {})",
        input.records_a.len(),
        input.records_b.len(),
        tolerance.amount_tolerance_percent,
        tolerance.date_tolerance_days,
        config.matching.tie_break,
    );

    let outcomes = match_records(
        &input.records_a,
        &input.records_b,
        &tolerance,
        config.matching.tie_break,
    );
    let summary = compute_summary(&outcomes);
    let result = MatchResult { tolerance, outcomes, summary };
    let insights = generate_insights(&result, &config.insights)?;

    Ok(ReconSnapshot {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        result,
        insights,
    })
}
