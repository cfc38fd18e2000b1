//! Error types for cbuild.
//!
//! Every variant is terminal for the current invocation. Unknown file types are
//! not errors; the orchestrator warns and skips them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    /// A path handed to the unit builder does not exist
    #[error("File not found: {}", path.display())]
    MissingSource { path: PathBuf },

    /// The compiler exited non-zero
    #[error("Build failed for {} (exit code: {code})", path.display())]
    CompileFailed {
        path: PathBuf,
        code: i32,
        output: String,
    },

    /// The linker exited non-zero
    #[error("Linking failed (exit code: {code})")]
    LinkFailed { code: i32, output: String },

    /// The built binary ran and exited non-zero
    #[error("{} exited with code {code}", binary.display())]
    ExecutionFailed { binary: PathBuf, code: i32 },

    /// The external program could not be started at all
    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Two inputs would write the same output file
    #[error("{} and {} both compile to {}", first.display(), second.display(), output.display())]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    /// The worker pool could not be created
    #[error("Failed to start build workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Captured compiler or linker text, if this failure carries any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            BuildError::CompileFailed { output, .. } | BuildError::LinkFailed { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}
