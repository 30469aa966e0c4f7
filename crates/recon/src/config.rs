use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::tolerance::ToleranceConfig;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration, usually read from a `.recon.toml` file.
///
/// Every section is optional. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub insights: InsightThresholds,
    #[serde(default)]
    pub columns: SourceColumns,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub tie_break: TieBreak,
}

/// Final tie-break between equally scored candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lowest B record id wins. Independent of B input order.
    #[default]
    LowestId,
    /// First candidate in B input order wins.
    InputOrder,
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowestId => write!(f, "lowest_id"),
            Self::InputOrder => write!(f, "input_order"),
        }
    }
}

// ---------------------------------------------------------------------------
// Insight thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// A month is a cluster when its unmatched count exceeds this.
    pub cluster_min_count: usize,
    /// Total variance above this is a high-severity finding.
    pub variance_high_cents: i64,
    /// Total variance above this is a medium-severity finding.
    pub variance_medium_cents: i64,
    /// Unmatched percentage above which coverage is flagged high.
    pub unmatched_ratio_high_pct: f64,
    /// Discrepant-pair percentage above which a tolerance review is suggested.
    pub discrepancy_ratio_medium_pct: f64,
    /// Keep only the top N vendors. `None` emits every vendor with an issue.
    pub vendor_limit: Option<usize>,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            cluster_min_count: 3,
            variance_high_cents: 100_000,
            variance_medium_cents: 10_000,
            unmatched_ratio_high_pct: 20.0,
            discrepancy_ratio_medium_pct: 30.0,
            vendor_limit: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// CSV header names for the four normalized fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub id: String,
    pub vendor: String,
    pub date: String,
    pub amount: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "id".into(),
            vendor: "vendor".into(),
            date: "date".into(),
            amount: "amount".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceColumns {
    pub a: ColumnMapping,
    pub b: ColumnMapping,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.tolerance.validate()?;

        let t = &self.insights;
        if t.variance_high_cents < 0 || t.variance_medium_cents < 0 {
            return Err(ReconError::ConfigValidation(
                "variance thresholds must be non-negative".into(),
            ));
        }
        if t.variance_medium_cents > t.variance_high_cents {
            return Err(ReconError::ConfigValidation(format!(
                "variance_medium_cents ({}) must not exceed variance_high_cents ({})",
                t.variance_medium_cents, t.variance_high_cents
            )));
        }
        for (name, pct) in [
            ("unmatched_ratio_high_pct", t.unmatched_ratio_high_pct),
            ("discrepancy_ratio_medium_pct", t.discrepancy_ratio_medium_pct),
        ] {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} must be between 0 and 100, got {pct}"
                )));
            }
        }
        if t.vendor_limit == Some(0) {
            return Err(ReconError::ConfigValidation(
                "vendor_limit must be at least 1 when set".into(),
            ));
        }

        for (side, cols) in [("a", &self.columns.a), ("b", &self.columns.b)] {
            for (field, header) in [
                ("id", &cols.id),
                ("vendor", &cols.vendor),
                ("date", &cols.date),
                ("amount", &cols.amount),
            ] {
                if header.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "columns.{side}.{field} must not be empty"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
