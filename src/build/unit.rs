use super::process::{CommandRunner, Invocation};
use super::source::{FileKind, SourceFile};
use super::target::BuildTarget;
use crate::error::BuildError;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

/// Everything a single compile needs besides the file itself. Shared
/// read-only between workers.
#[derive(Debug, Clone, Default)]
pub struct UnitSettings {
    pub compiler: String,
    pub flags: Vec<String>,
    /// Already normalized to an absolute path
    pub build_dir: PathBuf,
    pub force_rebuild: bool,
    pub include_paths: Vec<String>,
    pub library_paths: Vec<String>,
    pub libraries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub source: SourceFile,
    pub output: PathBuf,
    /// `false` when the existing output was reused
    pub rebuilt: bool,
    pub elapsed: Duration,
    /// Compiler chatter from a successful compile (warnings), unfiltered
    pub diagnostics: String,
}

/// Compose the compiler command for `target`.
pub fn compile_invocation(target: &BuildTarget, settings: &UnitSettings) -> Invocation {
    let mut inv = Invocation::new(&settings.compiler)
        .args(settings.flags.iter().cloned())
        .arg(&target.source.path)
        .args(settings.include_paths.iter().map(|p| format!("-I{}", p)))
        .args(settings.library_paths.iter().map(|p| format!("-L{}", p)))
        .args(settings.libraries.iter().map(|l| format!("-l{}", l)));

    if target.source.kind == FileKind::TranslationUnit {
        inv = inv
            .arg("-c")
            .arg("-o")
            .arg(&target.output);
    }
    inv
}

/// Build one file, or reuse its output when it is at least as new as the
/// source and no rebuild is forced.
pub fn build_file(
    source: &SourceFile,
    settings: &UnitSettings,
    runner: &dyn CommandRunner,
) -> Result<BuildResult, BuildError> {
    let start = Instant::now();
    let target = BuildTarget::new(source.clone(), &settings.build_dir);

    if settings.force_rebuild {
        target.ensure_source_exists()?;
    } else if target.is_fresh()? {
        debug!(file = %source.path.display(), output = %target.output.display(), "up to date, skipping");
        return Ok(BuildResult {
            source: target.source,
            output: target.output,
            rebuilt: false,
            elapsed: start.elapsed(),
            diagnostics: String::new(),
        });
    }

    if source.kind == FileKind::TranslationUnit
        && let Some(parent) = target.output.parent()
    {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }

    let invocation = compile_invocation(&target, settings);
    let result = runner.capture(&invocation)?;

    if !result.success() {
        return Err(BuildError::CompileFailed {
            path: target.source.path,
            code: result.code,
            output: result.output,
        });
    }

    debug!(file = %source.path.display(), elapsed = ?start.elapsed(), "compiled");
    Ok(BuildResult {
        source: target.source,
        output: target.output,
        rebuilt: true,
        elapsed: start.elapsed(),
        diagnostics: result.output,
    })
}
