//! Sweep driver: validate the positionals, plan, run the plan in order
//!
//! Argument checks happen before the configuration is resolved, so a bare
//! usage request works without any environment set up.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{DriverError, Result};
use crate::pipeline::{build_plan, Decoder, FoldSelection, Invocation, Mode, Trial};
use crate::runner::{CommandRunner, RunStatus};

/// Number of positionals that must be present before anything else is checked
pub const REQUIRED_POSITIONALS: usize = 3;

/// Positional arguments exactly as given (all optional at parse time)
#[derive(Debug, Clone, Default)]
pub struct Positionals {
    pub driver: Option<String>,
    pub model_name: Option<String>,
    pub data_source: Option<String>,
    pub penalty: Option<String>,
    pub fold_selector: Option<String>,
    pub mode: Option<String>,
}

impl Positionals {
    /// Leading positionals present, counting the same way a shell counts `$#`
    pub fn count(&self) -> usize {
        [
            &self.driver,
            &self.model_name,
            &self.data_source,
            &self.penalty,
            &self.fold_selector,
            &self.mode,
        ]
        .iter()
        .take_while(|v| v.is_some())
        .count()
    }
}

/// Present and not the empty string; whitespace counts as a value, like `[ -z "$4" ]`
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A fully resolved sweep over one trial
#[derive(Debug, Clone)]
pub struct Sweep {
    pub config: Config,
    pub trial: Trial,
    pub folds: FoldSelection,
    pub mode: Mode,
    pub decoder: Decoder,
}

/// Everything `--plan-json` prints
#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    trial: String,
    penalty: &'a str,
    folds: &'a [usize],
    mode: Mode,
    decoder: Decoder,
    config: &'a Config,
    invocations: Vec<Invocation>,
}

/// What happened over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub invoked: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub not_started: usize,
    pub skipped: usize,
}

impl Sweep {
    pub fn from_positionals<F>(positionals: &Positionals, decoder: Decoder, load_config: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Config>,
    {
        let count = positionals.count();
        if count < REQUIRED_POSITIONALS {
            return Err(DriverError::Usage(count));
        }
        let (Some(driver), Some(model_name), Some(data_source)) = (
            positionals.driver.clone(),
            positionals.model_name.clone(),
            positionals.data_source.clone(),
        ) else {
            return Err(DriverError::Usage(count));
        };
        let penalty = non_empty(&positionals.penalty)
            .ok_or(DriverError::MissingPenalty)?
            .to_string();

        let config = load_config()?;

        let folds = match non_empty(&positionals.fold_selector) {
            Some(selector) => FoldSelection::parse(selector, config.num_folds)?,
            None => FoldSelection::all(config.num_folds),
        };
        let mode = match non_empty(&positionals.mode) {
            Some(mode) => mode.parse()?,
            None => Mode::default(),
        };

        Ok(Sweep {
            config,
            trial: Trial { driver, model_name, data_source, penalty },
            folds,
            mode,
            decoder,
        })
    }

    pub fn plan(&self) -> Vec<Invocation> {
        build_plan(&self.config, &self.trial, &self.folds, self.mode, self.decoder)
    }

    pub fn plan_json(&self) -> Result<String> {
        let report = PlanReport {
            trial: self.trial.name(),
            penalty: &self.trial.penalty,
            folds: self.folds.indices(),
            mode: self.mode,
            decoder: self.decoder,
            config: &self.config,
            invocations: self.plan(),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Run every planned call in order. Failures of the called programs
    /// are logged and never stop the sweep.
    pub fn run(&self, runner: &mut dyn CommandRunner) -> Summary {
        let plan = self.plan();
        info!(
            "trial {}: {} call(s), folds {:?}, mode {:?}, penalty {}",
            self.trial.name(),
            plan.len(),
            self.folds.indices(),
            self.mode,
            self.trial.penalty
        );

        let mut summary = Summary::default();
        for invocation in &plan {
            summary.invoked += 1;
            debug!("{}", invocation.command_line());
            info!("[{}] fold {} / {}", invocation.stage, invocation.fold, invocation.split);
            match runner.run(invocation) {
                Ok(RunStatus::Success) => summary.succeeded += 1,
                Ok(RunStatus::Skipped) => summary.skipped += 1,
                Ok(RunStatus::Failed(code)) => {
                    summary.failed += 1;
                    warn!(
                        "[{}] fold {} / {} exited with {}",
                        invocation.stage,
                        invocation.fold,
                        invocation.split,
                        code.map_or_else(|| "a signal".to_string(), |c| format!("status {}", c))
                    );
                }
                Err(e) => {
                    summary.not_started += 1;
                    error!("[{}] fold {} / {}: {}", invocation.stage, invocation.fold, invocation.split, e);
                }
            }
        }

        info!(
            "done: {} call(s), {} ok, {} failed, {} not started, {} skipped",
            summary.invoked, summary.succeeded, summary.failed, summary.not_started, summary.skipped
        );
        summary
    }
}
