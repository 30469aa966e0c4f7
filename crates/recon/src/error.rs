use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Tolerance values out of range (negative, NaN, infinite).
    #[error("invalid tolerance: {0}")]
    InvalidTolerance(String),
    /// A record violates the input contract (empty id, duplicate id, wrong source).
    #[error("invalid record: source {source_set}, record '{record_id}': {reason}")]
    InvalidRecord {
        source_set: String,
        record_id: String,
        reason: String,
    },
    /// Both record sets are empty.
    #[error("nothing to reconcile: both record sets are empty")]
    EmptyInput,
    /// Insight generation requested for a result with zero records.
    #[error("no data: match result contains no records")]
    NoData,
    /// Another run currently holds the session.
    #[error("a reconciliation run is already in progress")]
    RunInProgress,
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (threshold ordering, bad values).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Missing required column in input data.
    #[error("source {source_set}: missing column '{column}'")]
    MissingColumn { source_set: String, column: String },
    /// Date parse error.
    #[error("source {source_set}, record '{record_id}': cannot parse date '{value}'")]
    DateParse {
        source_set: String,
        record_id: String,
        value: String,
    },
    /// Amount parse error.
    #[error("source {source_set}, record '{record_id}': cannot parse amount '{value}'")]
    AmountParse {
        source_set: String,
        record_id: String,
        value: String,
    },
    /// A CSV row that does not fit the header.
    #[error("source {source_set}, line {line}: {reason}")]
    MalformedRow {
        source_set: String,
        line: u64,
        reason: String,
    },
    /// IO error (file read, CSV write, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Io(e.to_string())
    }
}
