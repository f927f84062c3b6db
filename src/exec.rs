//! Execution of validated source.
//!
//! Running code is a capability handed to the driver rather than something
//! the analysis does itself. Tests pass closures; the binary uses
//! [`ProcessExecutor`] to feed the source to an external interpreter.

use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

/// Failure while running source.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("cannot start interpreter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot send source to interpreter: {0}")]
    Io(#[from] std::io::Error),
    #[error("interpreter exited with {status}")]
    Failed { status: ExitStatus },
    /// Failure reported by an in-process executor.
    #[error("{0}")]
    Runtime(String),
}

/// Something that can run source text.
pub trait Executor {
    /// Run `source` to completion.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` when the source cannot be run or fails.
    fn execute(&mut self, source: &str) -> Result<(), ExecutionError>;
}

impl<F> Executor for F
where
    F: FnMut(&str) -> Result<(), ExecutionError>,
{
    fn execute(&mut self, source: &str) -> Result<(), ExecutionError> {
        self(source)
    }
}

/// Runs source by piping it to `<program> -`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExecutor {
    program: String,
}

impl ProcessExecutor {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Executor for ProcessExecutor {
    fn execute(&mut self, source: &str) -> Result<(), ExecutionError> {
        debug!(program = %self.program, bytes = source.len(), "spawning interpreter");
        let mut child = Command::new(&self.program)
            .arg("-")
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping stdin closes the pipe so the child sees end of input.
        let written = child
            .stdin
            .take()
            .map_or(Ok(()), |mut stdin| stdin.write_all(source.as_bytes()));
        let status = child.wait()?;
        if !status.success() {
            return Err(ExecutionError::Failed { status });
        }
        written?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_executors() {
        let mut seen = Vec::new();
        let mut exec = |source: &str| -> Result<(), ExecutionError> {
            seen.push(source.to_string());
            Ok(())
        };
        exec.execute("x = 1\n").expect("closure executor");
        assert_eq!(seen, vec!["x = 1\n".to_string()]);
    }

    #[test]
    fn closure_errors_pass_through() {
        let mut exec =
            |_: &str| -> Result<(), ExecutionError> { Err(ExecutionError::Runtime("boom".into())) };
        let err = exec.execute("").unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn missing_interpreter_is_a_spawn_error() {
        let mut exec = ProcessExecutor::new("scopetrace-no-such-interpreter");
        let err = exec.execute("pass\n").unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert!(err.to_string().contains("scopetrace-no-such-interpreter"));
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_is_reported_as_failure() {
        // `false` exits without reading, so the write hits a closed pipe.
        let mut exec = ProcessExecutor::new("false");
        let source = "x = 1\n".repeat(200_000);
        let err = exec.execute(&source).unwrap_err();
        assert!(matches!(err, ExecutionError::Failed { .. }), "{err:?}");
    }
}
