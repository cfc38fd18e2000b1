//! Project orchestration.
//!
//! Files are split into headers and translation units, each group is compiled
//! on a bounded worker pool, and the objects are linked when anything changed.
//! Headers finish (and are checked) before any translation unit starts;
//! translation units finish before the link.
//!
//! The filesystem is the only cache. Nothing guards the build directory
//! against a second `cbuild` running at the same time; two concurrent
//! invocations on one build directory race on both the mtime checks and the
//! object files.

use super::diagnostics::DiagnosticFilter;
use super::process::{CommandRunner, Invocation};
use super::source::SourceFile;
use super::unit::{self, BuildResult, UnitSettings};
use super::target::BuildTarget;
use crate::error::BuildError;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ProjectOptions {
    /// Path of the linked binary
    pub output: PathBuf,
    pub unit: UnitSettings,
    /// Defaults to the compiler
    pub linker: Option<String>,
    /// Defaults to the compile flags
    pub link_flags: Option<Vec<String>>,
    /// Worker count; 1 builds strictly in order on the calling thread
    pub concurrency: usize,
    /// Run the binary after a successful build
    pub execute: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectReport {
    pub headers: Vec<BuildResult>,
    pub sources: Vec<BuildResult>,
    /// Unrecognized inputs that were skipped
    pub ignored: Vec<PathBuf>,
    pub linked: bool,
    pub executed: bool,
    pub elapsed: Duration,
}

impl ProjectReport {
    /// True when there were no translation units at all.
    pub fn nothing_to_build(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn rebuilt_count(&self) -> usize {
        self.headers
            .iter()
            .chain(&self.sources)
            .filter(|r| r.rebuilt)
            .count()
    }

    pub fn needs_linking(&self) -> bool {
        self.rebuilt_count() > 0
    }
}

pub struct Project<'a> {
    options: &'a ProjectOptions,
    runner: &'a dyn CommandRunner,
    filter: &'a dyn DiagnosticFilter,
}

impl<'a> Project<'a> {
    pub fn new(
        options: &'a ProjectOptions,
        runner: &'a dyn CommandRunner,
        filter: &'a dyn DiagnosticFilter,
    ) -> Self {
        Self {
            options,
            runner,
            filter,
        }
    }

    /// Build, link and optionally run `files`.
    pub fn build(&self, files: &[PathBuf]) -> Result<ProjectReport, BuildError> {
        let start = Instant::now();
        let mut report = ProjectReport::default();

        let (headers, sources) = partition(files, &mut report.ignored);
        for path in &report.ignored {
            debug!(file = %path.display(), "unknown file type, skipping");
            println!("{} Unknown file type: {}", "!".yellow(), path.display());
        }

        if sources.is_empty() {
            println!("{} No source files found. Nothing to do.", "!".yellow());
            return Ok(report);
        }

        check_collisions(headers.iter().chain(&sources), &self.options.unit.build_dir)?;

        let pool = if self.options.concurrency > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.options.concurrency)
                    .build()?,
            )
        } else {
            None
        };
        debug!(
            concurrency = self.options.concurrency,
            headers = headers.len(),
            sources = sources.len(),
            "starting build"
        );

        if !headers.is_empty() {
            report.headers = self
                .build_phase("headers", &headers, pool.as_ref())
                .inspect_err(|_| {
                    println!("{} Project build failed at headers :(", "x".red());
                })?;
        }

        report.sources = self
            .build_phase("sources", &sources, pool.as_ref())
            .inspect_err(|_| {
                println!("{} Project build failed :(", "x".red());
            })?;

        let needs_linking = report.needs_linking();
        let mut link_anyway = false;
        if !needs_linking {
            println!("{} Nothing modified. No build required.", "⚡".green());
            if !self.options.execute {
                report.elapsed = start.elapsed();
                return Ok(report);
            }
            // Running needs a binary even if every object was fresh
            link_anyway = !self.options.output.exists();
        }

        if needs_linking || link_anyway {
            self.link(&report.sources)?;
            report.linked = true;
            println!(
                "{} Linking Succeeded, built in {:.1} seconds",
                "✓".green(),
                start.elapsed().as_secs_f64()
            );
        }
        report.elapsed = start.elapsed();

        if self.options.execute {
            self.execute()?;
            report.executed = true;
        }
        Ok(report)
    }

    fn build_phase(
        &self,
        phase: &str,
        units: &[SourceFile],
        pool: Option<&rayon::ThreadPool>,
    ) -> Result<Vec<BuildResult>, BuildError> {
        let pb = ProgressBar::new(units.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message(format!("Compiling {}...", phase));

        let work = |source: &SourceFile| {
            let result = unit::build_file(source, &self.options.unit, self.runner);
            self.echo(&pb, source, &result);
            pb.inc(1);
            result
        };

        // Every dispatched unit runs to completion; the first error wins afterwards.
        let results: Vec<Result<BuildResult, BuildError>> = match pool {
            Some(pool) => pool.install(|| units.par_iter().map(work).collect()),
            None => units.iter().map(work).collect(),
        };
        pb.finish_and_clear();

        results.into_iter().collect()
    }

    fn echo(&self, pb: &ProgressBar, source: &SourceFile, result: &Result<BuildResult, BuildError>) {
        match result {
            Ok(r) if r.rebuilt => {
                let shown = self.filter.filter(&r.diagnostics);
                pb.suspend(|| {
                    if !shown.is_empty() {
                        println!("{}", shown);
                    }
                    println!(
                        "{} Build Succeeded for {} ({:.2?})",
                        "✓".green(),
                        source.path.display(),
                        r.elapsed
                    );
                });
            }
            Ok(_) => {}
            Err(BuildError::CompileFailed { code, output, .. }) => {
                let shown = self.filter.filter(output);
                pb.suspend(|| {
                    println!(
                        "{} {} for {} (exit code: {}):",
                        "x".red(),
                        "Build Failed".red().bold(),
                        source.path.display(),
                        code
                    );
                    if !shown.is_empty() {
                        println!("{}", shown);
                    }
                });
            }
            Err(e) => {
                pb.suspend(|| println!("{} {}", "x".red(), e));
            }
        }
    }

    /// Link every translation unit's object, fresh or reused.
    fn link(&self, sources: &[BuildResult]) -> Result<(), BuildError> {
        let invocation = link_invocation(self.options, sources);
        let result = self.runner.capture(&invocation)?;
        if !result.success() {
            println!(
                "{} {} (exit code: {}):",
                "x".red(),
                "Linking Failed".red().bold(),
                result.code
            );
            println!("{}", result.output.trim_end());
            return Err(BuildError::LinkFailed {
                code: result.code,
                output: result.output,
            });
        }
        let chatter = result.output.trim_end();
        if !chatter.is_empty() {
            println!("{}", chatter);
        }
        Ok(())
    }

    fn execute(&self) -> Result<(), BuildError> {
        let binary = runnable_path(&self.options.output);
        println!("{} Running {}...\n", "▶".green(), binary.display());
        let code = self
            .runner
            .stream(&Invocation::new(&binary))?;
        if code != 0 {
            return Err(BuildError::ExecutionFailed { binary, code });
        }
        Ok(())
    }
}

/// Split into (headers, translation units); anything else goes to `ignored`.
/// A file named twice, under any spelling, is built once.
fn partition(files: &[PathBuf], ignored: &mut Vec<PathBuf>) -> (Vec<SourceFile>, Vec<SourceFile>) {
    let mut headers = Vec::new();
    let mut sources = Vec::new();
    let mut seen = HashSet::new();

    for path in files {
        // Missing files keep their spelling and fail later as MissingSource
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            debug!(file = %path.display(), "already listed, skipping");
            continue;
        }
        match SourceFile::classify(path.clone()) {
            Some(file) if file.is_header() => headers.push(file),
            Some(file) => sources.push(file),
            None => ignored.push(path.clone()),
        }
    }
    (headers, sources)
}

/// No two inputs may share an output file, headers included.
fn check_collisions<'s>(
    files: impl IntoIterator<Item = &'s SourceFile>,
    build_dir: &Path,
) -> Result<(), BuildError> {
    let mut outputs: HashMap<PathBuf, &Path> = HashMap::new();
    for source in files {
        let output = BuildTarget::new(source.clone(), build_dir).output;
        if let Some(first) = outputs.get(&output) {
            return Err(BuildError::OutputCollision {
                first: first.to_path_buf(),
                second: source.path.clone(),
                output,
            });
        }
        outputs.insert(output, &source.path);
    }
    Ok(())
}

pub fn link_invocation(options: &ProjectOptions, sources: &[BuildResult]) -> Invocation {
    let unit = &options.unit;
    let linker = options.linker.as_deref().unwrap_or(&unit.compiler);
    let flags = options.link_flags.as_ref().unwrap_or(&unit.flags);

    Invocation::new(linker)
        .args(flags.iter().cloned())
        .args(unit.library_paths.iter().map(|p| format!("-L{}", p)))
        .args(unit.libraries.iter().map(|l| format!("-l{}", l)))
        .arg("-o")
        .arg(&options.output)
        .args(sources.iter().map(|r| r.output.as_os_str()))
}

/// A bare file name would be looked up on `PATH`; anchor it to the current
/// directory instead.
fn runnable_path(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => output.to_path_buf(),
        _ => Path::new(".").join(output),
    }
}
