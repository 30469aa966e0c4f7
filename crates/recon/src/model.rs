use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tolerance::ToleranceConfig;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which side of the reconciliation a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    A,
    B,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// A single normalized record from either source.
///
/// Amounts are minor units (cents) so exact-equality checks are integer
/// comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub source: Source,
    pub id: String,
    pub vendor: String,
    pub date: NaiveDate,
    pub amount_cents: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub raw: BTreeMap<String, String>,
}

impl Record {
    pub fn new(
        source: Source,
        id: impl Into<String>,
        vendor: impl Into<String>,
        date: NaiveDate,
        amount_cents: i64,
    ) -> Self {
        Self {
            source,
            id: id.into(),
            vendor: vendor.into(),
            date,
            amount_cents,
            raw: BTreeMap::new(),
        }
    }
}

/// Both record sets for one run, in input order.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub records_a: Vec<Record>,
    pub records_b: Vec<Record>,
}

impl ReconInput {
    pub fn new(records_a: Vec<Record>, records_b: Vec<Record>) -> Self {
        Self { records_a, records_b }
    }

    pub fn total_records(&self) -> usize {
        self.records_a.len() + self.records_b.len()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Field that can carry a discrepancy on a matched pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Vendor,
    Date,
    Amount,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Vendor, Field::Date, Field::Amount];
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vendor => write!(f, "vendor"),
            Self::Date => write!(f, "date"),
            Self::Amount => write!(f, "amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub record_a: Record,
    pub record_b: Record,
    /// Advisory: the pair matched, but these fields are not identical.
    pub discrepancies: BTreeSet<Field>,
    /// `b - a`, positive when B is larger. Saturates at the `i64` bounds.
    pub delta_cents: i64,
    /// `b - a` in days.
    pub date_offset_days: i64,
}

impl MatchedPair {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched(MatchedPair),
    UnmatchedA { record: Record },
    UnmatchedB { record: Record },
}

impl MatchOutcome {
    pub fn bucket(&self) -> ReconBucket {
        match self {
            Self::Matched(pair) if pair.is_clean() => ReconBucket::Matched,
            Self::Matched(_) => ReconBucket::Discrepant,
            Self::UnmatchedA { .. } => ReconBucket::UnmatchedA,
            Self::UnmatchedB { .. } => ReconBucket::UnmatchedB,
        }
    }

    pub fn record_a(&self) -> Option<&Record> {
        match self {
            Self::Matched(pair) => Some(&pair.record_a),
            Self::UnmatchedA { record } => Some(record),
            Self::UnmatchedB { .. } => None,
        }
    }

    pub fn record_b(&self) -> Option<&Record> {
        match self {
            Self::Matched(pair) => Some(&pair.record_b),
            Self::UnmatchedB { record } => Some(record),
            Self::UnmatchedA { .. } => None,
        }
    }

    /// The record that represents this row: A when present, otherwise B.
    pub fn primary(&self) -> &Record {
        match self {
            Self::Matched(pair) => &pair.record_a,
            Self::UnmatchedA { record } | Self::UnmatchedB { record } => record,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        !matches!(self, Self::Matched(_))
    }

    /// Absolute amount variance this row contributes.
    ///
    /// Unmatched rows count their whole amount; matched rows count `|b - a|`.
    /// Saturates at `i64::MAX`.
    pub fn variance_cents(&self) -> i64 {
        match self {
            Self::Matched(pair) => pair.delta_cents.saturating_abs(),
            Self::UnmatchedA { record } | Self::UnmatchedB { record } => {
                record.amount_cents.saturating_abs()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Display class of an outcome row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconBucket {
    Matched,
    Discrepant,
    UnmatchedA,
    UnmatchedB,
}

impl std::fmt::Display for ReconBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Discrepant => write!(f, "discrepant"),
            Self::UnmatchedA => write!(f, "unmatched_a"),
            Self::UnmatchedB => write!(f, "unmatched_b"),
        }
    }
}

impl std::str::FromStr for ReconBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "matched" => Ok(Self::Matched),
            "discrepant" | "partial" => Ok(Self::Discrepant),
            "unmatched_a" | "unmatcheda" | "a" => Ok(Self::UnmatchedA),
            "unmatched_b" | "unmatchedb" | "b" => Ok(Self::UnmatchedB),
            other => Err(format!("unknown bucket: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconSummary {
    /// Input records across both sources.
    pub total_records: usize,
    /// Outcome rows: one per pair plus one per unmatched record.
    pub outcome_rows: usize,
    pub matched: usize,
    pub discrepant: usize,
    pub unmatched_a: usize,
    pub unmatched_b: usize,
    pub matched_pct: f64,
    pub discrepant_pct: f64,
    /// Unmatched records as a percentage of `total_records`.
    pub unmatched_pct: f64,
    pub total_variance_cents: i64,
}

impl ReconSummary {
    pub fn unmatched(&self) -> usize {
        self.unmatched_a + self.unmatched_b
    }

    pub fn pairs(&self) -> usize {
        self.matched + self.discrepant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Tolerance snapshot the outcomes were computed under.
    pub tolerance: ToleranceConfig,
    pub outcomes: Vec<MatchOutcome>,
    pub summary: ReconSummary,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.summary.total_records == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = &MatchedPair> {
        self.outcomes.iter().filter_map(|o| match o {
            MatchOutcome::Matched(pair) => Some(pair),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    VendorConcentration,
    FieldFrequency,
    TimeClustering,
    AmountSeverity,
    CoverageRatio,
    DiscrepancyRatio,
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VendorConcentration => write!(f, "vendor_concentration"),
            Self::FieldFrequency => write!(f, "field_frequency"),
            Self::TimeClustering => write!(f, "time_clustering"),
            Self::AmountSeverity => write!(f, "amount_severity"),
            Self::CoverageRatio => write!(f, "coverage_ratio"),
            Self::DiscrepancyRatio => write!(f, "discrepancy_ratio"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn weight(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub priority: Priority,
    pub message: String,
    pub recommendation: String,
    pub supporting_metric: f64,
    /// Ordering key, higher first.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    pub engine_version: String,
    pub run_at: String,
}

/// Everything one run produces. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct ReconSnapshot {
    pub meta: ReconMeta,
    pub result: MatchResult,
    pub insights: Vec<Insight>,
}

/// Format minor units as a plain decimal string, e.g. `-1234` → `-12.34`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
