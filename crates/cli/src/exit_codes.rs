//! CLI Exit Code Registry
//!
//! Single source of truth for `pairwise` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success: every record matched with no discrepancies       |
//! | 1    | Reconciliation finished with discrepancies or unmatched   |
//! | 2    | CLI usage error (bad args, bad filter value)              |
//! | 3    | Invalid config (TOML parse, validation, bad tolerance)    |
//! | 4    | Runtime / input error (unreadable file, bad CSV row)      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `exit_code_for`

use pairwise_recon::ReconError;

/// Success.
pub const EXIT_SUCCESS: u8 = 0;

/// Like `diff(1)`: exit 1 means "sources differ".
pub const EXIT_RECON_MISMATCH: u8 = 1;

/// Usage error: bad arguments, unparseable flag values.
pub const EXIT_USAGE: u8 = 2;

/// Config file or tolerance values rejected.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// Input could not be read, parsed or reconciled.
pub const EXIT_RECON_RUNTIME: u8 = 4;

/// Map an engine error to its exit code.
pub fn exit_code_for(err: &ReconError) -> u8 {
    match err {
        ReconError::InvalidTolerance(_)
        | ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::InvalidRecord { .. }
        | ReconError::EmptyInput
        | ReconError::NoData
        | ReconError::RunInProgress
        | ReconError::MissingColumn { .. }
        | ReconError::DateParse { .. }
        | ReconError::AmountParse { .. }
        | ReconError::MalformedRow { .. }
        | ReconError::Io(_) => EXIT_RECON_RUNTIME,
    }
}
