//! CSV loading into normalized records.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::ColumnMapping;
use crate::error::ReconError;
use crate::model::{Record, Source};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Parse a calendar date in one of the accepted layouts.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse a decimal currency amount into minor units.
///
/// Accepts an optional leading `$`, thousands separators, a leading minus or
/// accounting-style parentheses, and at most two decimals.
pub fn parse_amount_cents(value: &str) -> Option<i64> {
    let mut s = value.trim();
    let mut negative = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start();
    }
    s = s.strip_prefix('$').unwrap_or(s);

    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    let cents = whole.checked_mul(100)?.checked_add(frac)?;
    Some(if negative { -cents } else { cents })
}

fn row_error(source: Source, err: csv::Error) -> ReconError {
    match err.kind() {
        csv::ErrorKind::UnequalLengths { pos, expected_len, len } => ReconError::MalformedRow {
            source_set: source.to_string(),
            line: pos.as_ref().map_or(0, |p| p.line()),
            reason: format!("expected {expected_len} fields, found {len}"),
        },
        _ => ReconError::Io(err.to_string()),
    }
}

/// Load CSV rows into records, applying the column mapping.
///
/// Rows with an empty id are skipped.
pub fn load_csv_records(
    source: Source,
    csv_data: &str,
    columns: &ColumnMapping,
) -> Result<Vec<Record>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
            source_set: source.to_string(),
            column: name.into(),
        })
    };

    let id_idx = idx(&columns.id)?;
    let vendor_idx = idx(&columns.vendor)?;
    let date_idx = idx(&columns.date)?;
    let amount_idx = idx(&columns.amount)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = row.map_err(|e| row_error(source, e))?;

        let id = row.get(id_idx).unwrap_or("").trim().to_string();
        if id.is_empty() {
            skipped += 1;
            continue;
        }
        let vendor = row.get(vendor_idx).unwrap_or("").trim().to_string();

        let date_str = row.get(date_idx).unwrap_or("");
        let date = parse_date(date_str).ok_or_else(|| ReconError::DateParse {
            source_set: source.to_string(),
            record_id: id.clone(),
            value: date_str.into(),
        })?;

        let amount_str = row.get(amount_idx).unwrap_or("");
        let amount_cents = parse_amount_cents(amount_str).ok_or_else(|| ReconError::AmountParse {
            source_set: source.to_string(),
            record_id: id.clone(),
            value: amount_str.into(),
        })?;

        let raw: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| row.get(i).map(|v| (h.clone(), v.to_string())))
            .collect();

        records.push(Record { source, id, vendor, date, amount_cents, raw });
    }

    if skipped > 0 {
        log::warn!("source {source}: skipped {skipped} row(s) without an id");
    }
    log::debug!("source {source}: loaded {} records", records.len());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts() {
        assert_eq!(parse_amount_cents("550.00"), Some(55000));
        assert_eq!(parse_amount_cents("550"), Some(55000));
        assert_eq!(parse_amount_cents("550.5"), Some(55050));
        assert_eq!(parse_amount_cents(" $1,234.56 "), Some(123456));
        assert_eq!(parse_amount_cents("-12.30"), Some(-1230));
        assert_eq!(parse_amount_cents("(12.30)"), Some(-1230));
        assert_eq!(parse_amount_cents("-$5"), Some(-500));
        assert_eq!(parse_amount_cents(".75"), Some(75));
        assert_eq!(parse_amount_cents("1.234"), None);
        assert_eq!(parse_amount_cents("abc"), None);
        assert_eq!(parse_amount_cents(""), None);
        assert_eq!(parse_amount_cents("1.2.3"), None);
    }

    #[test]
    fn dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 29).unwrap();
        assert_eq!(parse_date("2024-01-29"), Some(expected));
        assert_eq!(parse_date("2024/01/29"), Some(expected));
        assert_eq!(parse_date("01/29/2024"), Some(expected));
        assert_eq!(parse_date("29-01-2024"), Some(expected));
        assert_eq!(parse_date("Jan 29"), None);
    }

    #[test]
    fn load_basic() {
        let csv = "\
id,vendor,date,amount,memo
INV015,Local Vendor A,2024-01-29,550.00,first
INV016, Theta Corp ,2024-02-09,890.00,
,,,,
";
        let records = load_csv_records(Source::A, csv, &ColumnMapping::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "INV015");
        assert_eq!(records[0].amount_cents, 55000);
        assert_eq!(records[0].source, Source::A);
        assert_eq!(records[0].raw["memo"], "first");
        assert_eq!(records[1].vendor, "Theta Corp");
    }

    #[test]
    fn load_with_mapping() {
        let csv = "\
Doc No,Party Name,Invoice Date,Amount
D-1,Acme,03/01/2024,\"1,000.00\"
";
        let columns = ColumnMapping {
            id: "Doc No".into(),
            vendor: "Party Name".into(),
            date: "Invoice Date".into(),
            amount: "Amount".into(),
        };
        let records = load_csv_records(Source::B, csv, &columns).unwrap();
        assert_eq!(records[0].amount_cents, 100_000);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn missing_column() {
        let csv = "id,vendor,date\n1,Acme,2024-01-01\n";
        let err = load_csv_records(Source::A, csv, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column, .. } if column == "amount"));
    }

    #[test]
    fn short_row_is_malformed() {
        let csv = "id,vendor,date,amount\n1,Acme,2024-01-01,10\n2,Acme,2024-01-02\n";
        let err = load_csv_records(Source::B, csv, &ColumnMapping::default()).unwrap_err();
        match err {
            ReconError::MalformedRow { source_set, line, reason } => {
                assert_eq!(source_set, "B");
                assert_eq!(line, 3);
                assert_eq!(reason, "expected 4 fields, found 3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_date_and_amount() {
        let csv = "id,vendor,date,amount\n1,Acme,someday,10\n";
        let err = load_csv_records(Source::A, csv, &ColumnMapping::default()).unwrap_err();
        assert!(err.to_string().contains("cannot parse date 'someday'"));

        let csv = "id,vendor,date,amount\n1,Acme,2024-01-01,ten\n";
        let err = load_csv_records(Source::B, csv, &ColumnMapping::default()).unwrap_err();
        assert!(err.to_string().contains("source B, record '1': cannot parse amount 'ten'"));
    }
}
