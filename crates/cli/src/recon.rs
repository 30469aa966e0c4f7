//! `pairwise run` / `pairwise validate`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;

use pairwise_recon::export::export_snapshot;
use pairwise_recon::load::{load_csv_records, parse_amount_cents};
use pairwise_recon::model::{format_cents, MatchOutcome, ReconSnapshot};
use pairwise_recon::{
    MatchResult, ReconBucket, ReconConfig, ReconSession, Record, ResultFilter, Source,
    ToleranceConfig,
};

use crate::exit_codes::EXIT_RECON_MISMATCH;
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile two CSV files
    #[command(after_help = "\
Examples:
  pairwise run ledger.csv bank.csv
  pairwise run ledger.csv bank.csv --amount-tolerance 10 --date-tolerance 5
  pairwise run ledger.csv bank.csv --config ap.recon.toml --json
  pairwise run ledger.csv bank.csv --bucket unmatched_a --vendor acme
  pairwise run ledger.csv bank.csv --export out/")]
    Run {
        /// Source A CSV (e.g. the ledger)
        a: PathBuf,

        /// Source B CSV (e.g. the bank feed)
        b: PathBuf,

        /// Path to a .recon.toml config (tolerance, thresholds, column names)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Amount tolerance in percent; overrides the config
        #[arg(long, value_name = "PERCENT", allow_negative_numbers = true)]
        amount_tolerance: Option<f64>,

        /// Date tolerance in days; overrides the config
        #[arg(long, value_name = "DAYS", allow_negative_numbers = true)]
        date_tolerance: Option<i64>,

        /// Output JSON to stdout instead of the row listing
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write results, summary and insights CSVs into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,

        /// Only show rows in this bucket (matched, discrepant, unmatched_a, unmatched_b)
        #[arg(long, value_parser = parse_bucket)]
        bucket: Option<ReconBucket>,

        /// Only show rows whose vendor contains this text
        #[arg(long)]
        vendor: Option<String>,

        /// Only show rows whose id or vendor contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only show rows with amount at least this much
        #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
        min_amount: Option<i64>,

        /// Only show rows with amount at most this much
        #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
        max_amount: Option<i64>,

        /// Suppress the human summary on stderr
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  pairwise validate ap.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

fn parse_bucket(s: &str) -> Result<ReconBucket, String> {
    s.parse()
}

fn parse_amount(s: &str) -> Result<i64, String> {
    parse_amount_cents(s).ok_or_else(|| format!("not an amount: {s}"))
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run {
            a,
            b,
            config,
            amount_tolerance,
            date_tolerance,
            json,
            output,
            export,
            bucket,
            vendor,
            search,
            min_amount,
            max_amount,
            quiet,
        } => {
            let filter = ResultFilter {
                bucket,
                search,
                vendor,
                min_amount_cents: min_amount,
                max_amount_cents: max_amount,
            };
            let opts = RunOptions { config, amount_tolerance, date_tolerance, json, output, export, quiet };
            cmd_recon_run(&a, &b, opts, filter)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(&config),
    }
}

struct RunOptions {
    config: Option<PathBuf>,
    amount_tolerance: Option<f64>,
    date_tolerance: Option<i64>,
    json: bool,
    output: Option<PathBuf>,
    export: Option<PathBuf>,
    quiet: bool,
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&config_str).map_err(CliError::recon)
}

/// Config tolerance with any command-line overrides applied.
fn resolve_tolerance(
    config: &ReconConfig,
    amount: Option<f64>,
    days: Option<i64>,
) -> Result<ToleranceConfig, CliError> {
    let amount = amount.unwrap_or(config.tolerance.amount_tolerance_percent);
    let days = days.unwrap_or_else(|| i64::from(config.tolerance.date_tolerance_days));
    ToleranceConfig::from_raw(amount, days).map_err(CliError::recon)
}

fn load_side(source: Source, path: &Path, config: &ReconConfig) -> Result<Vec<Record>, CliError> {
    let csv_data = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    let columns = match source {
        Source::A => &config.columns.a,
        Source::B => &config.columns.b,
    };
    let records = load_csv_records(source, &csv_data, columns).map_err(CliError::recon)?;
    log::info!("loaded {} records for source {source} from {}", records.len(), path.display());
    Ok(records)
}

/// The snapshot restricted to rows passing `filter`. Summary and insights
/// still describe the whole run.
fn filtered_view(snapshot: &Arc<ReconSnapshot>, filter: &ResultFilter) -> Arc<ReconSnapshot> {
    if filter.is_empty() {
        return Arc::clone(snapshot);
    }
    let outcomes: Vec<MatchOutcome> = filter.apply(&snapshot.result.outcomes).into_iter().cloned().collect();
    Arc::new(ReconSnapshot {
        meta: snapshot.meta.clone(),
        result: MatchResult { outcomes, ..snapshot.result.clone() },
        insights: snapshot.insights.clone(),
    })
}

fn cmd_recon_run(a: &Path, b: &Path, opts: RunOptions, filter: ResultFilter) -> Result<(), CliError> {
    if let (Some(min), Some(max)) = (filter.min_amount_cents, filter.max_amount_cents) {
        if min > max {
            return Err(CliError::args(format!(
                "--min-amount {} is greater than --max-amount {}",
                format_cents(min),
                format_cents(max)
            )));
        }
    }

    let config = match &opts.config {
        Some(path) => load_config(path)?,
        None => ReconConfig::default(),
    };
    let tolerance = resolve_tolerance(&config, opts.amount_tolerance, opts.date_tolerance)?;

    let records_a = load_side(Source::A, a, &config)?;
    let records_b = load_side(Source::B, b, &config)?;

    let session = ReconSession::global(config);
    let snapshot = session.run(records_a, records_b, tolerance).map_err(CliError::recon)?;
    let view = filtered_view(&snapshot, &filter);

    if opts.json || opts.output.is_some() {
        let json_str = serde_json::to_string_pretty(&*view)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = opts.output {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            if !opts.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if opts.json {
            println!("{json_str}");
        }
    }
    if !opts.json {
        print_rows(&view.result.outcomes);
    }

    if let Some(ref dir) = opts.export {
        let paths = export_snapshot(dir, &view).map_err(CliError::recon)?;
        if !opts.quiet {
            for p in paths {
                eprintln!("wrote {}", p.display());
            }
        }
    }

    if !opts.quiet {
        print_summary(&snapshot, view.result.outcomes.len());
    }

    let s = &snapshot.result.summary;
    if s.discrepant > 0 || s.unmatched() > 0 {
        return Err(CliError {
            code: EXIT_RECON_MISMATCH,
            message: "discrepancies or unmatched records found".into(),
            hint: None,
        });
    }
    Ok(())
}

fn print_rows(outcomes: &[MatchOutcome]) {
    for o in outcomes {
        let id_a = o.record_a().map(|r| r.id.as_str()).unwrap_or("-");
        let id_b = o.record_b().map(|r| r.id.as_str()).unwrap_or("-");
        let primary = o.primary();
        let flags = match o {
            MatchOutcome::Matched(pair) if !pair.is_clean() => pair
                .discrepancies
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(","),
            _ => String::new(),
        };
        println!(
            "{:<11}  {:<12}  {:<12}  {:<24}  {}  {:>12}  {}",
            o.bucket(),
            id_a,
            id_b,
            primary.vendor,
            primary.date,
            format_cents(primary.amount_cents),
            flags
        );
    }
}

fn print_summary(snapshot: &ReconSnapshot, shown: usize) {
    let r = &snapshot.result;
    let s = &r.summary;
    eprintln!(
        "recon: {} records, {} rows: {} matched, {} discrepant, {} unmatched A, {} unmatched B",
        s.total_records, s.outcome_rows, s.matched, s.discrepant, s.unmatched_a, s.unmatched_b,
    );
    eprintln!(
        "tolerance: amount {}%, date {}d; total variance {}",
        r.tolerance.amount_tolerance_percent,
        r.tolerance.date_tolerance_days,
        format_cents(s.total_variance_cents),
    );
    if shown != s.outcome_rows {
        eprintln!("showing {shown} of {} rows", s.outcome_rows);
    }
    for i in &snapshot.insights {
        eprintln!("  [{}] {}", i.priority, i.message);
        eprintln!("         {}", i.recommendation);
    }
}

fn cmd_recon_validate(path: &Path) -> Result<(), CliError> {
    let config = load_config(path).map_err(|e| e.with_hint("see `pairwise run --help` for the config sections"))?;
    eprintln!(
        "{}: ok (amount {}%, date {}d, tie-break {})",
        config.name.as_deref().unwrap_or("config"),
        config.tolerance.amount_tolerance_percent,
        config.tolerance.date_tolerance_days,
        config.matching.tie_break,
    );
    Ok(())
}
