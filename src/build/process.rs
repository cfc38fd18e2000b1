//! Spawning external tools.
//!
//! Every compiler, linker and program run goes through [`CommandRunner`].
//! Arguments travel as an argv vector, never through a shell, so nothing needs
//! quoting. The orchestrator only looks at the exit status; captured text is
//! for humans.

use crate::error::BuildError;
use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// One program plus its arguments. Both are kept as OS strings so paths that
/// are not valid UTF-8 reach the child byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// Lossy; for logs only.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a captured run: exit code and interleaved stdout/stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub output: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

pub trait CommandRunner: Sync {
    /// Run to completion, capturing stdout and stderr as one stream.
    fn capture(&self, invocation: &Invocation) -> Result<ToolOutput, BuildError>;

    /// Run with inherited stdio so output appears live. Returns the exit code.
    fn stream(&self, invocation: &Invocation) -> Result<i32, BuildError>;
}

/// Runs real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn capture(&self, invocation: &Invocation) -> Result<ToolOutput, BuildError> {
        debug!(command = %invocation, "spawning");
        let spawn_err = |source| BuildError::Spawn {
            program: invocation.program_name(),
            source,
        };

        let (mut reader, writer) = std::io::pipe().map_err(spawn_err)?;
        let stdout_writer = writer.try_clone().map_err(spawn_err)?;

        let mut child = {
            let mut cmd = Command::new(&invocation.program);
            cmd.args(&invocation.args)
                .stdin(Stdio::null())
                .stdout(stdout_writer)
                .stderr(writer);
            // `cmd` owns the write ends; it must drop before we read to EOF.
            cmd.spawn().map_err(spawn_err)?
        };

        let mut raw = Vec::new();
        reader.read_to_end(&mut raw).map_err(spawn_err)?;
        let status = child.wait().map_err(spawn_err)?;
        let code = exit_code(status);
        trace!(program = %invocation.program.to_string_lossy(), code, bytes = raw.len(), "process finished");

        Ok(ToolOutput {
            code,
            output: String::from_utf8_lossy(&raw).into_owned(),
        })
    }

    fn stream(&self, invocation: &Invocation) -> Result<i32, BuildError> {
        debug!(command = %invocation, "running");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| BuildError::Spawn {
                program: invocation.program_name(),
                source,
            })?;
        Ok(exit_code(status))
    }
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => -status.signal().unwrap_or(1),
    }
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
