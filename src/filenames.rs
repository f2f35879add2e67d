//! Path construction for one trial
//!
//! Every file the sweep touches is named from the trial name, the fold
//! index, the split and (after decoding) the penalty value:
//!
//! posterior:  {outputs}/{trial}/{fold}/{split}.hdf5
//! estimation: {estimations}/{trial}/{fold}/{split}_{penalty}.json
//! results:    {results}/{trial}/{fold}/{split}_{penalty}.txt
//!
//! The penalty is used exactly as typed: "0.5" and "0.50" name different files.

use std::path::{Path, PathBuf};

use crate::pipeline::Split;

/// Trial name: driver, model name and data source joined by dashes
pub fn trial_name(driver: &str, model_name: &str, data_source: &str) -> String {
    format!("{}-{}-{}", driver, model_name, data_source)
}

fn fold_dir(root: &Path, trial: &str, fold: usize) -> PathBuf {
    root.join(trial).join(fold.to_string())
}

/// Posterior file produced upstream by the model
pub fn posterior_path(outputs_dir: &Path, trial: &str, fold: usize, split: Split) -> PathBuf {
    fold_dir(outputs_dir, trial, fold).join(format!("{}.hdf5", split))
}

/// Estimation written by the aggregation program
pub fn estimation_path(
    estimations_dir: &Path,
    trial: &str,
    fold: usize,
    split: Split,
    penalty: &str,
) -> PathBuf {
    fold_dir(estimations_dir, trial, fold).join(format!("{}_{}.json", split, penalty))
}

/// Scores written by the scoring program
pub fn results_path(
    results_dir: &Path,
    trial: &str,
    fold: usize,
    split: Split,
    penalty: &str,
) -> PathBuf {
    fold_dir(results_dir, trial, fold).join(format!("{}_{}.txt", split, penalty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_name_joins_with_dashes() {
        assert_eq!(trial_name("cnn", "v1", "msd"), "cnn-v1-msd");
    }

    #[test]
    fn paths_follow_layout() {
        let trial = trial_name("cnn", "v1", "msd");
        assert_eq!(
            posterior_path(Path::new("/b/outputs"), &trial, 0, Split::Train),
            PathBuf::from("/b/outputs/cnn-v1-msd/0/train.hdf5")
        );
        assert_eq!(
            estimation_path(Path::new("/b/estimations"), &trial, 3, Split::Valid, "0.5"),
            PathBuf::from("/b/estimations/cnn-v1-msd/3/valid_0.5.json")
        );
        assert_eq!(
            results_path(Path::new("/b/results"), &trial, 4, Split::Test, "-20"),
            PathBuf::from("/b/results/cnn-v1-msd/4/test_-20.txt")
        );
    }

    #[test]
    fn penalty_is_not_normalized() {
        let a = estimation_path(Path::new("/e"), "t", 0, Split::Train, "0.5");
        let b = estimation_path(Path::new("/e"), "t", 0, Split::Train, "0.50");
        assert_ne!(a, b);
        // same inputs, same bytes
        assert_eq!(a, estimation_path(Path::new("/e"), "t", 0, Split::Train, "0.5"));
    }
}
