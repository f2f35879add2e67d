/// Aggregate and score a cross-validated chord estimation trial
///
/// For every selected fold and every split (train, valid, test), decode the
/// model posteriors into estimations with the aggregation program, then
/// score those estimations with the scoring program. Both are external
/// Python programs; this binary only builds their paths and calls them.
///
/// CLI Usage:
///   chordeval cnn v1 msd -20                   # all folds, aggregate + score
///   chordeval cnn v1 msd -20 "0 1" aggregate   # folds 0 and 1, aggregation only
///   chordeval --dry-run cnn v1 msd -20 3       # print the calls for fold 3
///
/// Options go before the positionals; arguments past the sixth are ignored.
/// By default every path exits 0, usage and argument errors included;
/// pass --strict-exit for conventional exit codes.

mod config;
mod driver;
mod error;
mod filenames;
mod pipeline;
mod runner;
mod utils;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::config::{Config, Overrides};
use crate::driver::{Positionals, Summary, Sweep};
use crate::error::{DriverError, ExitPolicy, Result};
use crate::pipeline::Decoder;
use crate::runner::{DryRunner, ProcessRunner};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "chordeval")]
#[command(about = "Aggregate and score chord estimations over cross-validation folds", long_about = None)]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Driver name (first part of the trial name)
    driver: Option<String>,

    /// Model name
    model_name: Option<String>,

    /// Data source name
    data_source: Option<String>,

    /// Viterbi penalty value, used verbatim in file names
    #[arg(allow_hyphen_values = true)]
    penalty_value: Option<String>,

    /// Folds to run: "3", "0 1 2", "0,2", "1-3" or "all" [default: all]
    #[arg(allow_hyphen_values = true)]
    fold_selector: Option<String>,

    /// One of aggregate, score, all [default: all]
    #[arg(allow_hyphen_values = true)]
    mode: Option<String>,

    /// Anything past the mode, ignored
    #[arg(hide = true, allow_hyphen_values = true)]
    extra: Vec<String>,

    /// Decoding method for the aggregation descriptor
    #[arg(long, value_enum, default_value_t = Decoder::Viterbi)]
    decoder: Decoder,

    /// Print the calls instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Print the full plan as JSON and exit
    #[arg(long)]
    plan_json: bool,

    /// Exit non-zero on usage (2) and argument or configuration errors (1)
    #[arg(long)]
    strict_exit: bool,

    /// Base directory (overrides $DL4MIR)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Directory holding the Python programs (overrides $DL4MIR_SRC)
    #[arg(long)]
    src_dir: Option<PathBuf>,

    /// Python interpreter (overrides $PYTHON)
    #[arg(long)]
    python: Option<OsString>,

    /// Also write the log to a timestamped file in the current directory
    #[arg(long)]
    log_file: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn positionals(&self) -> Positionals {
        Positionals {
            driver: self.driver.clone(),
            model_name: self.model_name.clone(),
            data_source: self.data_source.clone(),
            penalty: self.penalty_value.clone(),
            fold_selector: self.fold_selector.clone(),
            mode: self.mode.clone(),
        }
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            base_dir: self.base_dir.clone(),
            src_dir: self.src_dir.clone(),
            python: self.python.clone(),
        }
    }
}

fn usage_text() -> String {
    Args::command().render_help().to_string()
}

/// Resolve, then either print the plan or run it.
fn run(args: &Args, out: &mut dyn Write) -> Result<Option<Summary>> {
    let overrides = args.overrides();
    let sweep = Sweep::from_positionals(&args.positionals(), args.decoder, || {
        Config::from_env(&overrides)
    })?;

    if args.plan_json {
        writeln!(out, "{}", sweep.plan_json()?)?;
        return Ok(None);
    }

    tracing::info!("{}", utils::banner(&format!("chordeval - {}", sweep.trial.name())));
    let summary = if args.dry_run {
        let mut runner = DryRunner::new(out);
        sweep.run(&mut runner)
    } else {
        sweep.run(&mut ProcessRunner)
    };
    Ok(Some(summary))
}

/// User-facing text for the outcome: usage on stdout, errors on stderr.
fn report(outcome: &Result<Option<Summary>>, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<()> {
    match outcome {
        Err(DriverError::Usage(_)) => write!(out, "{}", usage_text()),
        Err(DriverError::Cli(msg)) => write!(err, "{}", msg),
        Err(e) => writeln!(err, "Error: {}", e),
        Ok(_) => Ok(()),
    }
}

/// Parse, run and report; returns the process exit code.
/// Parser errors go through the same exit policy as driver errors.
fn main_with(argv: Vec<OsString>, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            if let Err(write_err) = write!(out, "{}", e.render()) {
                eprintln!("Warning: Could not write help: {}", write_err);
            }
            return 0;
        }
        Err(e) => {
            let strict = argv.iter().any(|a| a.to_str() == Some("--strict-exit"));
            let outcome = Err(DriverError::Cli(e.render().to_string()));
            if let Err(write_err) = report(&outcome, out, err) {
                eprintln!("Warning: Could not write error: {}", write_err);
            }
            return ExitPolicy::from_flag(strict).code_for(&outcome.map(|_: Option<Summary>| ()));
        }
    };

    let policy = ExitPolicy::from_flag(args.strict_exit);
    utils::init_logging(args.verbose, args.log_file);

    let outcome = run(&args, out);
    if let Err(write_err) = report(&outcome, out, err) {
        eprintln!("Warning: Could not write report: {}", write_err);
    }
    policy.code_for(&outcome.map(|_| ()))
}

fn main() {
    let code = main_with(std::env::args_os().collect(), &mut io::stdout(), &mut io::stderr());
    if let Err(e) = io::stdout().flush() {
        eprintln!("Warning: Could not flush stdout: {}", e);
    }
    std::process::exit(code);
}
