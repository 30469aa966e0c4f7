//! Insight generation: ranked, human-readable findings derived from a match
//! result.
//!
//! Each category is computed independently and every qualifying insight is
//! emitted. Ordering is by `score`, which is the priority weight (x100) plus
//! a 0..100 impact term specific to the category.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::config::InsightThresholds;
use crate::error::ReconError;
use crate::matcher::normalize_vendor;
use crate::model::{
    format_cents, Field, Insight, InsightCategory, MatchResult, Priority, ReconBucket,
};
use crate::summary::round_to;

const MAX_IMPACT: f64 = 99.9;

fn insight(
    category: InsightCategory,
    priority: Priority,
    message: String,
    recommendation: impl Into<String>,
    supporting_metric: f64,
    impact: f64,
) -> Insight {
    Insight {
        category,
        priority,
        message,
        recommendation: recommendation.into(),
        supporting_metric,
        score: priority.weight() * 100.0 + impact.clamp(0.0, MAX_IMPACT),
    }
}

/// Derive all insights for `result`, highest score first.
pub fn generate_insights(
    result: &MatchResult,
    thresholds: &InsightThresholds,
) -> Result<Vec<Insight>, ReconError> {
    if result.is_empty() {
        return Err(ReconError::NoData);
    }

    let mut insights = vendor_concentration(result, thresholds);
    insights.extend(field_frequency(result));
    insights.extend(time_clustering(result, thresholds));
    insights.extend(amount_severity(result, thresholds));
    insights.push(coverage_ratio(result, thresholds));
    insights.extend(discrepancy_ratio(result, thresholds));

    insights.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then_with(|| x.category.cmp(&y.category))
            .then_with(|| x.message.cmp(&y.message))
    });

    log::debug!("generated {} insights", insights.len());
    Ok(insights)
}

// ---------------------------------------------------------------------------
// Vendor concentration
// ---------------------------------------------------------------------------

struct VendorStats {
    display: String,
    issues: usize,
    variance_cents: i64,
}

fn vendor_concentration(result: &MatchResult, thresholds: &InsightThresholds) -> Vec<Insight> {
    let mut by_vendor: BTreeMap<String, VendorStats> = BTreeMap::new();
    let mut total_issues = 0usize;

    for o in result.outcomes.iter().filter(|o| o.bucket() != ReconBucket::Matched) {
        let vendor = &o.primary().vendor;
        let stats = by_vendor.entry(normalize_vendor(vendor)).or_insert_with(|| VendorStats {
            display: vendor.trim().to_string(),
            issues: 0,
            variance_cents: 0,
        });
        stats.issues += 1;
        stats.variance_cents = stats.variance_cents.saturating_add(o.variance_cents());
        total_issues += 1;
    }

    let mut ranked: Vec<VendorStats> = by_vendor.into_values().collect();
    ranked.sort_by(|x, y| {
        y.issues
            .cmp(&x.issues)
            .then_with(|| y.variance_cents.cmp(&x.variance_cents))
            .then_with(|| x.display.cmp(&y.display))
    });
    if let Some(limit) = thresholds.vendor_limit {
        ranked.truncate(limit);
    }

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, v)| {
            let priority = if rank == 0 { Priority::High } else { Priority::Medium };
            let noun = if v.issues == 1 { "issue" } else { "issues" };
            insight(
                InsightCategory::VendorConcentration,
                priority,
                format!(
                    "Review records for \"{}\": {} {noun} with total variance of {}",
                    v.display,
                    v.issues,
                    format_cents(v.variance_cents)
                ),
                "Filter results by this vendor and review each transaction",
                v.issues as f64,
                v.issues as f64 / total_issues as f64 * 100.0,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Field frequency
// ---------------------------------------------------------------------------

fn field_recommendation(field: Field) -> &'static str {
    match field {
        Field::Amount => "Consider adjusting the amount tolerance or review pricing agreements",
        Field::Date => "Check for timezone differences or date format inconsistencies between systems",
        Field::Vendor => "Verify vendor naming standards between systems",
    }
}

fn field_frequency(result: &MatchResult) -> Option<Insight> {
    let mut counts: BTreeMap<Field, usize> = BTreeMap::new();
    for pair in result.pairs() {
        for field in &pair.discrepancies {
            *counts.entry(*field).or_insert(0) += 1;
        }
    }

    // First field in declaration order wins a tie.
    let (field, count) = Field::ALL
        .iter()
        .map(|f| (*f, counts.get(f).copied().unwrap_or(0)))
        .fold((Field::Vendor, 0), |best, cur| if cur.1 > best.1 { cur } else { best });
    if count == 0 {
        return None;
    }

    Some(insight(
        InsightCategory::FieldFrequency,
        Priority::High,
        format!(
            "\"{}\" field has {count} discrepancies, the most common issue",
            field.to_string().to_uppercase()
        ),
        field_recommendation(field),
        count as f64,
        count as f64 / result.summary.pairs() as f64 * 100.0,
    ))
}

// ---------------------------------------------------------------------------
// Time clustering
// ---------------------------------------------------------------------------

fn time_clustering(result: &MatchResult, thresholds: &InsightThresholds) -> Option<Insight> {
    let mut months: BTreeMap<(i32, u32), (usize, NaiveDate)> = BTreeMap::new();
    let mut unmatched = 0usize;
    for o in result.outcomes.iter().filter(|o| o.is_unmatched()) {
        let date = o.primary().date;
        months.entry((date.year(), date.month())).or_insert((0, date)).0 += 1;
        unmatched += 1;
    }

    // Earliest month wins a tie.
    let (count, date) = months
        .values()
        .fold(None, |best: Option<(usize, NaiveDate)>, &(count, date)| match best {
            Some(b) if b.0 >= count => Some(b),
            _ => Some((count, date)),
        })?;
    if count <= thresholds.cluster_min_count {
        return None;
    }

    Some(insight(
        InsightCategory::TimeClustering,
        Priority::Medium,
        format!(
            "{count} of {unmatched} unmatched entries fall in {}",
            date.format("%b %Y")
        ),
        "Investigate whether system changes or special events occurred during this period",
        count as f64,
        count as f64 / unmatched as f64 * 100.0,
    ))
}

// ---------------------------------------------------------------------------
// Amount severity
// ---------------------------------------------------------------------------

fn amount_severity(result: &MatchResult, thresholds: &InsightThresholds) -> Option<Insight> {
    let total = result.summary.total_variance_cents;
    let metric = total as f64 / 100.0;
    let impact = total as f64 / thresholds.variance_high_cents.max(1) as f64 * 50.0;

    if total > thresholds.variance_high_cents {
        Some(insight(
            InsightCategory::AmountSeverity,
            Priority::High,
            format!("Total amount variance of {} detected", format_cents(total)),
            "Significant financial discrepancy: prioritize reconciliation of high-value transactions",
            metric,
            impact,
        ))
    } else if total > thresholds.variance_medium_cents {
        Some(insight(
            InsightCategory::AmountSeverity,
            Priority::Medium,
            format!("Amount variance of {} detected", format_cents(total)),
            "Review transactions with the largest variances first",
            metric,
            impact,
        ))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// Always emitted, even at 0%.
fn coverage_ratio(result: &MatchResult, thresholds: &InsightThresholds) -> Insight {
    let s = &result.summary;
    let ratio = s.unmatched() as f64 / s.total_records as f64 * 100.0;
    let shown = round_to(ratio, 1);

    let (priority, recommendation) = if ratio > thresholds.unmatched_ratio_high_pct {
        (Priority::High, "Verify that both sources cover the same time period and scope")
    } else if s.unmatched() > 0 {
        (Priority::Low, "Confirm the remaining unmatched records cover the same period in both sources")
    } else {
        (Priority::Low, "Every record found a counterpart; spot-check discrepant pairs before sign-off")
    };

    insight(
        InsightCategory::CoverageRatio,
        priority,
        format!(
            "{shown:.1}% of records are unmatched ({} of {})",
            s.unmatched(),
            s.total_records
        ),
        recommendation,
        shown,
        ratio,
    )
}

fn discrepancy_ratio(result: &MatchResult, thresholds: &InsightThresholds) -> Option<Insight> {
    let s = &result.summary;
    if s.outcome_rows == 0 {
        return None;
    }
    let ratio = s.discrepant as f64 / s.outcome_rows as f64 * 100.0;
    if ratio <= thresholds.discrepancy_ratio_medium_pct {
        return None;
    }
    let shown = round_to(ratio, 1);
    Some(insight(
        InsightCategory::DiscrepancyRatio,
        Priority::Medium,
        format!("{shown:.1}% of result rows are matched with discrepancies"),
        "Consider adjusting tolerance settings or investigate systematic data differences",
        shown,
        ratio,
    ))
}
