//! Directory layout and program locations
//!
//! The layout used to be read from the process environment wherever it was
//! needed. It is now resolved once, at startup, into a `Config` which is
//! passed down explicitly. `from_lookup` takes any key lookup so that tests
//! never have to touch the real environment.
//!
//! Layout under the base directory:
//! - labeled_intervals/  labels
//! - metadata/           metadata
//! - partitions/         dataset partitions (fold files)
//! - outputs/            model posteriors, one .hdf5 per fold and split
//! - estimations/        decoded estimations (JSON), written by aggregation
//! - results/            scores (text), written by scoring

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::error::{DriverError, Result};

/// Number of cross-validation folds
pub const NUM_FOLDS: usize = 5;

pub const ENV_BASE_DIR: &str = "DL4MIR";
pub const ENV_SRC_DIR: &str = "DL4MIR_SRC";
pub const ENV_PYTHON: &str = "PYTHON";

const DEFAULT_PYTHON: &str = "python";
const AGGREGATE_SCRIPT: &str = "chords/aggregate_likelihood_estimations.py";
const SCORE_SCRIPT: &str = "chords/score_estimations.py";

/// Paths are carried as raw OS strings and only made lossy when displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    #[serde(serialize_with = "lossy")]
    pub base_dir: PathBuf,
    #[serde(serialize_with = "lossy")]
    pub labels_dir: PathBuf,
    #[serde(serialize_with = "lossy")]
    pub metadata_dir: PathBuf,
    #[serde(serialize_with = "lossy")]
    pub partitions_dir: PathBuf,
    #[serde(serialize_with = "lossy")]
    pub outputs_dir: PathBuf,
    #[serde(serialize_with = "lossy")]
    pub estimations_dir: PathBuf,
    #[serde(serialize_with = "lossy")]
    pub results_dir: PathBuf,
    /// Interpreter the programs are run with
    #[serde(serialize_with = "lossy")]
    pub python: OsString,
    #[serde(serialize_with = "lossy")]
    pub aggregate_program: PathBuf,
    #[serde(serialize_with = "lossy")]
    pub score_program: PathBuf,
    pub num_folds: usize,
}

/// Values given on the command line take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub src_dir: Option<PathBuf>,
    pub python: Option<OsString>,
}

pub(crate) fn lossy<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<OsStr>,
    S: Serializer,
{
    serializer.serialize_str(&value.as_ref().to_string_lossy())
}

pub(crate) fn lossy_seq<S>(values: &[OsString], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(values.iter().map(|v| v.to_string_lossy()))
}

impl Config {
    /// Derive the whole layout from a base directory and a source directory.
    pub fn with_dirs(base_dir: &Path, src_dir: &Path, python: impl AsRef<OsStr>) -> Self {
        Config {
            base_dir: base_dir.to_path_buf(),
            labels_dir: base_dir.join("labeled_intervals"),
            metadata_dir: base_dir.join("metadata"),
            partitions_dir: base_dir.join("partitions"),
            outputs_dir: base_dir.join("outputs"),
            estimations_dir: base_dir.join("estimations"),
            results_dir: base_dir.join("results"),
            python: python.as_ref().to_os_string(),
            aggregate_program: src_dir.join(AGGREGATE_SCRIPT),
            score_program: src_dir.join(SCORE_SCRIPT),
            num_folds: NUM_FOLDS,
        }
    }

    /// Build from the real process environment. Values need not be UTF-8.
    pub fn from_env(overrides: &Overrides) -> Result<Self> {
        Self::from_lookup(|key| std::env::var_os(key), overrides)
    }

    pub fn from_lookup<F>(lookup: F, overrides: &Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        // empty variables count as unset, like `${VAR:-default}`
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let base_dir = match &overrides.base_dir {
            Some(dir) => dir.clone(),
            None => get(ENV_BASE_DIR).map(PathBuf::from).ok_or_else(|| {
                DriverError::Config(format!(
                    "{} is not set and no --base-dir was given",
                    ENV_BASE_DIR
                ))
            })?,
        };
        let src_dir = overrides
            .src_dir
            .clone()
            .or_else(|| get(ENV_SRC_DIR).map(PathBuf::from))
            .unwrap_or_else(|| base_dir.join("src"));
        let python = overrides
            .python
            .clone()
            .or_else(|| get(ENV_PYTHON))
            .unwrap_or_else(|| OsString::from(DEFAULT_PYTHON));

        Ok(Self::with_dirs(&base_dir, &src_dir, python))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn layout_is_derived_from_base() {
        let cfg = Config::from_lookup(lookup_from(&[("DL4MIR", "/data/chords")]), &Overrides::default())
            .expect("config");
        assert_eq!(cfg.outputs_dir, PathBuf::from("/data/chords/outputs"));
        assert_eq!(cfg.estimations_dir, PathBuf::from("/data/chords/estimations"));
        assert_eq!(cfg.results_dir, PathBuf::from("/data/chords/results"));
        assert_eq!(cfg.labels_dir, PathBuf::from("/data/chords/labeled_intervals"));
        assert_eq!(cfg.metadata_dir, PathBuf::from("/data/chords/metadata"));
        assert_eq!(cfg.partitions_dir, PathBuf::from("/data/chords/partitions"));
        assert_eq!(
            cfg.aggregate_program,
            PathBuf::from("/data/chords/src/chords/aggregate_likelihood_estimations.py")
        );
        assert_eq!(cfg.python, "python");
        assert_eq!(cfg.num_folds, 5);
    }

    #[test]
    fn src_and_python_come_from_env() {
        let cfg = Config::from_lookup(
            lookup_from(&[("DL4MIR", "/d"), ("DL4MIR_SRC", "/code/dl4mir"), ("PYTHON", "python2.7")]),
            &Overrides::default(),
        )
        .expect("config");
        assert_eq!(cfg.score_program, PathBuf::from("/code/dl4mir/chords/score_estimations.py"));
        assert_eq!(cfg.python, "python2.7");
    }

    #[test]
    fn overrides_win_over_env() {
        let overrides = Overrides {
            base_dir: Some(PathBuf::from("/other")),
            src_dir: None,
            python: Some(OsString::from("python3")),
        };
        let cfg = Config::from_lookup(lookup_from(&[("DL4MIR", "/d"), ("PYTHON", "py")]), &overrides)
            .expect("config");
        assert_eq!(cfg.base_dir, PathBuf::from("/other"));
        assert_eq!(cfg.outputs_dir, PathBuf::from("/other/outputs"));
        assert_eq!(cfg.python, "python3");
    }

    #[test]
    fn missing_or_empty_base_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[]), &Overrides::default()).unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
        let err = Config::from_lookup(lookup_from(&[("DL4MIR", "")]), &Overrides::default()).unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_base_is_kept_byte_for_byte() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/data/\xffchords").to_os_string();
        let lookup = move |key: &str| (key == "DL4MIR").then(|| raw.clone());
        let cfg = Config::from_lookup(lookup, &Overrides::default()).expect("config");
        assert_eq!(cfg.outputs_dir.as_os_str().as_bytes(), b"/data/\xffchords/outputs");

        let json = serde_json::to_value(&cfg).expect("json");
        assert_eq!(json["outputs_dir"], "/data/\u{fffd}chords/outputs");
    }
}
