//! # cbuild CLI Entry Point
//!
//! Parses flags, layers them over `cbuild.toml`, discovers sources and hands
//! everything to the project orchestrator. Exits 1 if any compile, the link,
//! or the requested run fails.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cbuild::build::{DiagnosticsMode, Project, SystemRunner};
use cbuild::config::{self, BuildConfig};
use cbuild::discover;
use cbuild::ui;

const SOURCE_EXTENSIONS: &[&str] = &[".cpp", ".c"];
const HEADER_EXTENSIONS: &[&str] = &[".h", ".hpp"];

#[derive(Parser)]
#[command(name = "cbuild")]
#[command(about = "Build C/C++ sources in parallel, link them, and optionally run the result", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Files to build instead of discovering them
    files: Vec<PathBuf>,
    /// Run the built executable after a successful compilation
    #[arg(long)]
    run: bool,
    /// Force a full rebuild
    #[arg(long)]
    rebuild: bool,
    /// Compiler to use [default: g++]
    #[arg(long)]
    compiler: Option<String>,
    /// Linker to use (defaults to the compiler)
    #[arg(long)]
    linker: Option<String>,
    /// Name of binary to output [default: builder.out]
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Directory for intermediate build files [default: ./]
    #[arg(long, alias = "builddir")]
    build_dir: Option<String>,
    /// Maximum number of files to build in parallel (defaults to the CPU count)
    #[arg(long, short = 'j')]
    concurrency: Option<usize>,
    /// Space-separated include directories
    #[arg(long, allow_hyphen_values = true)]
    include_paths: Option<String>,
    /// Space-separated library directories
    #[arg(long, allow_hyphen_values = true)]
    library_paths: Option<String>,
    /// Space-separated library names (without -l)
    #[arg(long, allow_hyphen_values = true)]
    libraries: Option<String>,
    /// Space-separated compiler flags
    #[arg(long, allow_hyphen_values = true)]
    build_flags: Option<String>,
    /// Space-separated linker flags (defaults to the build flags)
    #[arg(long, allow_hyphen_values = true)]
    link_flags: Option<String>,
    /// Space-separated substrings; matching file names are not built
    #[arg(long, allow_hyphen_values = true)]
    ignore_files: Option<String>,
    /// Search subdirectories for sources
    #[arg(long, short)]
    recursive: bool,
    /// Also precompile discovered .h/.hpp headers
    #[arg(long)]
    headers: bool,
    /// Directory to search for sources [default: current directory]
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Config file [default: ./cbuild.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,
    /// Named [profile.*] table from the config file
    #[arg(long)]
    profile: Option<String>,
    /// Compiler output filtering
    #[arg(long, value_enum)]
    diagnostics: Option<DiagnosticsMode>,
    /// Print a per-file table after the build
    #[arg(long)]
    summary: bool,
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Settings given on the command line, as a layer over the config file.
    fn overrides(&self) -> BuildConfig {
        BuildConfig {
            compiler: self.compiler.clone(),
            linker: self.linker.clone(),
            output: self.output.clone(),
            build_dir: self.build_dir.clone(),
            flags: split_list(&self.build_flags),
            link_flags: split_list(&self.link_flags),
            include_paths: split_list(&self.include_paths),
            library_paths: split_list(&self.library_paths),
            libraries: split_list(&self.libraries),
            ignore: split_list(&self.ignore_files),
            headers: None,
            recursive: self.recursive.then_some(true),
            concurrency: self.concurrency,
            diagnostics: self.diagnostics,
        }
    }
}

fn split_list(raw: &Option<String>) -> Option<Vec<String>> {
    raw.as_ref()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cbuild={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let file_config = config::load_config(cli.config.as_deref())?;
    let resolved = file_config
        .layered(cli.profile.as_deref())?
        .overlay(cli.overrides())
        .resolve(&cwd, cli.rebuild, cli.run);

    let filter = match cli.diagnostics {
        Some(mode) => mode.into_filter(),
        None => file_config.diagnostic_filter(resolved.diagnostics)?,
    };

    let mut files = if cli.files.is_empty() {
        let mut extensions = SOURCE_EXTENSIONS.to_vec();
        if cli.headers {
            extensions.extend_from_slice(HEADER_EXTENSIONS);
        }
        let mut found = Vec::new();
        for ext in extensions {
            found.extend(discover::files_with_extension(
                ext,
                cli.dir.as_deref(),
                resolved.recursive,
                &resolved.ignore,
            )?);
        }
        found
    } else {
        cli.files.clone()
    };
    files.extend(resolved.headers.iter().cloned());

    let report = Project::new(&resolved.options, &SystemRunner, filter.as_ref()).build(&files)?;
    if cli.summary {
        ui::print_summary(&report);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "x".red(), e);
        std::process::exit(1);
    }
}
