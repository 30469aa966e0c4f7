//! CSV export of results, summary and insights.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ReconError;
use crate::model::{format_cents, Insight, MatchOutcome, ReconSnapshot, ReconSummary};

pub const RESULTS_FILE: &str = "reconciliation_results.csv";
pub const SUMMARY_FILE: &str = "reconciliation_summary.csv";
pub const INSIGHTS_FILE: &str = "reconciliation_insights.csv";

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn differences(outcome: &MatchOutcome) -> String {
    let MatchOutcome::Matched(pair) = outcome else {
        return String::new();
    };
    pair.discrepancies
        .iter()
        .map(|field| {
            let (a, b) = match field {
                crate::model::Field::Vendor => (pair.record_a.vendor.clone(), pair.record_b.vendor.clone()),
                crate::model::Field::Date => (pair.record_a.date.to_string(), pair.record_b.date.to_string()),
                crate::model::Field::Amount => (
                    format_cents(pair.record_a.amount_cents),
                    format_cents(pair.record_b.amount_cents),
                ),
            };
            format!("{field}: {a} -> {b}")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// One row per outcome.
pub fn write_results_csv<W: Write>(writer: W, outcomes: &[MatchOutcome]) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([
        "type",
        "id_a",
        "id_b",
        "vendor_a",
        "vendor_b",
        "date_a",
        "date_b",
        "amount_a",
        "amount_b",
        "variance",
        "differences",
    ])?;

    for o in outcomes {
        let a = o.record_a();
        let b = o.record_b();
        let variance = match o {
            MatchOutcome::Matched(pair) => pair.delta_cents,
            MatchOutcome::UnmatchedA { record } => record.amount_cents,
            MatchOutcome::UnmatchedB { record } => record.amount_cents.saturating_neg(),
        };
        w.write_record([
            o.bucket().to_string(),
            opt(a.map(|r| &r.id)),
            opt(b.map(|r| &r.id)),
            opt(a.map(|r| &r.vendor)),
            opt(b.map(|r| &r.vendor)),
            opt(a.map(|r| r.date)),
            opt(b.map(|r| r.date)),
            opt(a.map(|r| format_cents(r.amount_cents))),
            opt(b.map(|r| format_cents(r.amount_cents))),
            format_cents(variance),
            differences(o),
        ])?;
    }

    w.flush()?;
    Ok(())
}

pub fn write_summary_csv<W: Write>(writer: W, summary: &ReconSummary) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["metric", "value"])?;
    let rows = [
        ("total_records", summary.total_records.to_string()),
        ("outcome_rows", summary.outcome_rows.to_string()),
        ("matched", summary.matched.to_string()),
        ("matched_pct", format!("{:.2}", summary.matched_pct)),
        ("discrepant", summary.discrepant.to_string()),
        ("discrepant_pct", format!("{:.2}", summary.discrepant_pct)),
        ("unmatched_a", summary.unmatched_a.to_string()),
        ("unmatched_b", summary.unmatched_b.to_string()),
        ("unmatched_pct", format!("{:.2}", summary.unmatched_pct)),
        ("total_variance", format_cents(summary.total_variance_cents)),
    ];
    for (metric, value) in rows {
        w.write_record([metric, value.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_insights_csv<W: Write>(writer: W, insights: &[Insight]) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["category", "priority", "message", "recommendation", "metric"])?;
    for i in insights {
        w.write_record([
            i.category.to_string(),
            i.priority.to_string(),
            i.message.clone(),
            i.recommendation.clone(),
            i.supporting_metric.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Write all three exports into `dir`, returning the written paths.
pub fn export_snapshot(dir: &Path, snapshot: &ReconSnapshot) -> Result<Vec<PathBuf>, ReconError> {
    std::fs::create_dir_all(dir)?;

    let results = dir.join(RESULTS_FILE);
    write_results_csv(std::fs::File::create(&results)?, &snapshot.result.outcomes)?;

    let summary = dir.join(SUMMARY_FILE);
    write_summary_csv(std::fs::File::create(&summary)?, &snapshot.result.summary)?;

    let insights = dir.join(INSIGHTS_FILE);
    write_insights_csv(std::fs::File::create(&insights)?, &snapshot.insights)?;

    log::info!("exported results to {}", dir.display());
    Ok(vec![results, summary, insights])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use crate::engine::run;
    use crate::model::{ReconInput, Record, Source};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn snapshot() -> ReconSnapshot {
        let input = ReconInput::new(
            vec![
                Record::new(Source::A, "A1", "Acme", d("2024-03-01"), 10000),
                Record::new(Source::A, "A2", "Beta", d("2024-03-02"), 2500),
            ],
            vec![Record::new(Source::B, "B1", "Acme", d("2024-03-02"), 10200)],
        );
        run(&ReconConfig::default(), &input).unwrap()
    }

    #[test]
    fn results_rows() {
        let snap = snapshot();
        let mut buf = Vec::new();
        write_results_csv(&mut buf, &snap.result.outcomes).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("type,id_a,id_b"));
        assert_eq!(
            lines[1],
            "discrepant,A1,B1,Acme,Acme,2024-03-01,2024-03-02,100.00,102.00,2.00,\
             date: 2024-03-01 -> 2024-03-02; amount: 100.00 -> 102.00"
        );
        assert_eq!(lines[2], "unmatched_a,A2,,Beta,,2024-03-02,,25.00,,25.00,");
    }

    #[test]
    fn extreme_unmatched_b_amount_exports() {
        let record = Record::new(Source::B, "B1", "Acme", d("2024-03-01"), i64::MIN);
        let mut buf = Vec::new();
        write_results_csv(&mut buf, &[MatchOutcome::UnmatchedB { record }]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.ends_with(&format!("{},", format_cents(i64::MAX))), "{row}");
    }

    #[test]
    fn summary_rows() {
        let snap = snapshot();
        let mut buf = Vec::new();
        write_summary_csv(&mut buf, &snap.result.summary).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("total_records,3"));
        assert!(text.contains("total_variance,27.00"));
    }

    #[test]
    fn export_to_dir() {
        let snap = snapshot();
        let dir = tempfile::tempdir().unwrap();
        let paths = export_snapshot(dir.path(), &snap).unwrap();
        assert_eq!(paths.len(), 3);
        for p in &paths {
            assert!(p.exists(), "{} missing", p.display());
        }
        let insights = std::fs::read_to_string(dir.path().join(INSIGHTS_FILE)).unwrap();
        assert!(insights.starts_with("category,priority,message"));
        assert!(insights.contains("coverage_ratio"));
    }
}
