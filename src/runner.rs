//! Running external programs, one blocking call at a time

use std::io::Write;
use std::process::Command;

use crate::error::{DriverError, Result};
use crate::pipeline::Invocation;

/// How a finished call ended. The driver only logs this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Non-zero exit; `None` when killed by a signal
    Failed(Option<i32>),
    /// Not run (dry run)
    Skipped,
}

/// Runs one invocation to completion before returning.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<RunStatus>;
}

/// Spawns the real program, inheriting stdin/stdout/stderr.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<RunStatus> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| DriverError::Spawn {
                program: invocation.program.to_string_lossy().into_owned(),
                source,
            })?;
        if status.success() {
            Ok(RunStatus::Success)
        } else {
            Ok(RunStatus::Failed(status.code()))
        }
    }
}

/// Writes each command line instead of running it.
pub struct DryRunner<W: Write> {
    out: W,
}

impl<W: Write> DryRunner<W> {
    pub fn new(out: W) -> Self {
        DryRunner { out }
    }
}

impl<W: Write> CommandRunner for DryRunner<W> {
    fn run(&mut self, invocation: &Invocation) -> Result<RunStatus> {
        writeln!(self.out, "{}", invocation.command_line())?;
        Ok(RunStatus::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Split, Stage};

    fn invocation(program: &str, args: &[&str]) -> Invocation {
        Invocation {
            stage: Stage::Aggregate,
            fold: 0,
            split: Split::Train,
            program: program.into(),
            args: args.iter().map(|a| a.into()).collect(),
        }
    }

    #[test]
    fn dry_runner_prints_one_line_per_call() {
        let mut out: Vec<u8> = Vec::new();
        let mut runner = DryRunner::new(&mut out);
        let status = runner.run(&invocation("python", &["a.py", "x.hdf5"])).unwrap();
        assert_eq!(status, RunStatus::Skipped);
        runner.run(&invocation("python", &["b.py"])).unwrap();
        drop(runner);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "python a.py x.hdf5\npython b.py\n");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut runner = ProcessRunner;
        let err = runner
            .run(&invocation("chordeval-no-such-program-xyz", &[]))
            .unwrap_err();
        assert!(matches!(err, DriverError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_reported() {
        let mut runner = ProcessRunner;
        assert_eq!(runner.run(&invocation("true", &[])).unwrap(), RunStatus::Success);
        assert_eq!(
            runner.run(&invocation("sh", &["-c", "exit 3"])).unwrap(),
            RunStatus::Failed(Some(3))
        );
    }
}
