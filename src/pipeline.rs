//! Stages, splits and the ordered plan of external calls
//!
//! A plan is the flat list of `Invocation`s the driver runs, in order:
//! folds as selected, then train/valid/test within a fold, then aggregation
//! before scoring within a split.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::{self, Config};
use crate::error::{DriverError, Result};
use crate::filenames;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage(s) of the pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Aggregate,
    Score,
    #[default]
    All,
}

impl Mode {
    pub fn aggregates(self) -> bool {
        matches!(self, Mode::Aggregate | Mode::All)
    }

    pub fn scores(self) -> bool {
        matches!(self, Mode::Score | Mode::All)
    }
}

impl FromStr for Mode {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aggregate" => Ok(Mode::Aggregate),
            "score" => Ok(Mode::Score),
            "all" => Ok(Mode::All),
            other => Err(DriverError::InvalidMode(other.to_string())),
        }
    }
}

/// Decoding method named in the descriptor handed to the aggregation program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decoder {
    #[default]
    Viterbi,
}

impl Decoder {
    pub fn name(self) -> &'static str {
        match self {
            Decoder::Viterbi => "viterbi",
        }
    }

    /// e.g. `viterbi:penalty=0.5`
    pub fn descriptor(self, penalty: &str) -> String {
        format!("{}:penalty={}", self.name(), penalty)
    }
}

/// Fold indices to run, in the order given, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSelection(Vec<usize>);

impl FoldSelection {
    pub fn all(num_folds: usize) -> Self {
        FoldSelection((0..num_folds).collect())
    }

    /// Accepts `3`, `"0 1 2"`, `0,2,4`, `1-3` (inclusive) or `all`.
    pub fn parse(selector: &str, num_folds: usize) -> Result<Self> {
        let invalid = |reason: String| DriverError::InvalidFold {
            selector: selector.to_string(),
            reason,
        };
        let index = |token: &str| -> Result<usize> {
            let idx: usize = token
                .trim()
                .parse()
                .map_err(|_| invalid(format!("'{}' is not a fold index", token.trim())))?;
            if idx >= num_folds {
                return Err(invalid(format!("fold {} is out of range 0..{}", idx, num_folds)));
            }
            Ok(idx)
        };

        if selector.trim() == "all" {
            return Ok(Self::all(num_folds));
        }

        let mut folds = Vec::new();
        let mut seen = HashSet::new();
        for token in selector.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            let range = match token.split_once('-') {
                Some((lo, hi)) => {
                    let (lo, hi) = (index(lo)?, index(hi)?);
                    if lo > hi {
                        return Err(invalid(format!("empty range {}", token)));
                    }
                    lo..=hi
                }
                None => {
                    let idx = index(token)?;
                    idx..=idx
                }
            };
            for idx in range {
                if seen.insert(idx) {
                    folds.push(idx);
                }
            }
        }

        if folds.is_empty() {
            return Err(invalid("no fold index given".to_string()));
        }
        Ok(FoldSelection(folds))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// The trial being evaluated, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial {
    pub driver: String,
    pub model_name: String,
    pub data_source: String,
    pub penalty: String,
}

impl Trial {
    pub fn name(&self) -> String {
        filenames::trial_name(&self.driver, &self.model_name, &self.data_source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Aggregate,
    Score,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Aggregate => f.write_str("aggregate"),
            Stage::Score => f.write_str("score"),
        }
    }
}

/// One blocking call to an external program. Program and arguments are
/// passed to the OS exactly as built; only displays are lossy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub stage: Stage,
    pub fold: usize,
    pub split: Split,
    #[serde(serialize_with = "config::lossy")]
    pub program: OsString,
    #[serde(serialize_with = "config::lossy_seq")]
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Shell-like rendering, for logs and dry runs
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Build the ordered list of calls for a trial.
pub fn build_plan(
    config: &Config,
    trial: &Trial,
    folds: &FoldSelection,
    mode: Mode,
    decoder: Decoder,
) -> Vec<Invocation> {
    let name = trial.name();
    let descriptor = OsString::from(decoder.descriptor(&trial.penalty));

    let mut plan = Vec::with_capacity(folds.len() * Split::ALL.len() * 2);
    for &fold in folds.indices() {
        for split in Split::ALL {
            let estimation = filenames::estimation_path(
                &config.estimations_dir,
                &name,
                fold,
                split,
                &trial.penalty,
            );

            if mode.aggregates() {
                let posterior = filenames::posterior_path(&config.outputs_dir, &name, fold, split);
                plan.push(Invocation {
                    stage: Stage::Aggregate,
                    fold,
                    split,
                    program: config.python.clone(),
                    args: vec![
                        config.aggregate_program.clone().into_os_string(),
                        posterior.into_os_string(),
                        descriptor.clone(),
                        estimation.clone().into_os_string(),
                    ],
                });
            }
            if mode.scores() {
                let results =
                    filenames::results_path(&config.results_dir, &name, fold, split, &trial.penalty);
                plan.push(Invocation {
                    stage: Stage::Score,
                    fold,
                    split,
                    program: config.python.clone(),
                    args: vec![
                        config.score_program.clone().into_os_string(),
                        estimation.into_os_string(),
                        results.into_os_string(),
                    ],
                });
            }
        }
    }
    plan
}
