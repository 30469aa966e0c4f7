//! `pairwise-recon`: two-source record matching and insight engine.
//!
//! Pure engine crate: receives pre-loaded records, returns matched pairs,
//! unmatched records, a summary and ranked insights. CSV loading and export
//! helpers live here too; the CLI only wires them together.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod insights;
pub mod load;
pub mod matcher;
pub mod model;
pub mod session;
pub mod store;
pub mod summary;
pub mod tolerance;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use filter::ResultFilter;
pub use model::{
    Insight, MatchOutcome, MatchResult, ReconBucket, ReconInput, ReconSnapshot, Record, Source,
};
pub use session::ReconSession;
pub use store::ResultStore;
pub use tolerance::ToleranceConfig;
