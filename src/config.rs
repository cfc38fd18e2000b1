//! Configuration file parsing (`cbuild.toml`).
//!
//! Every setting is optional. Values are layered: built-in defaults, then
//! `[build]`, then the selected `[profile.<name>]`, then command-line flags.
//!
//! ```toml
//! [build]
//! compiler = "g++"
//! output = "app"
//! build_dir = "build"
//! flags = ["-O2", "-Wall"]
//! libraries = ["m"]
//! ignore = ["test"]
//!
//! [profile.debug]
//! flags = ["-g", "-O0"]
//! output = "appd"
//!
//! [diagnostics]
//! drop = [": note:"]
//! stop_at = ["^Multiple include guards"]
//! ```

use crate::build::{
    DiagnosticFilter, DiagnosticsMode, PatternFilter, ProjectOptions, UnitSettings,
    normalize_build_dir,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "cbuild.toml";

pub const DEFAULT_COMPILER: &str = "g++";
pub const DEFAULT_OUTPUT: &str = "builder.out";
pub const DEFAULT_BUILD_DIR: &str = "./";
pub const DEFAULT_FLAGS: &[&str] = &["-O2", "-g", "-mtune=native", "-fopenmp"];

#[derive(Deserialize, Debug, Default, Clone)]
pub struct CbuildConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub profile: HashMap<String, BuildConfig>,
    pub diagnostics: Option<DiagnosticsConfig>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct BuildConfig {
    pub compiler: Option<String>,
    pub linker: Option<String>,
    pub output: Option<PathBuf>,
    pub build_dir: Option<String>,
    pub flags: Option<Vec<String>>,
    pub link_flags: Option<Vec<String>>,
    pub include_paths: Option<Vec<String>>,
    pub library_paths: Option<Vec<String>>,
    pub libraries: Option<Vec<String>>,
    /// Substrings that exclude files from discovery
    pub ignore: Option<Vec<String>>,
    /// Extra headers to precompile, outside discovery
    pub headers: Option<Vec<PathBuf>>,
    pub recursive: Option<bool>,
    pub concurrency: Option<usize>,
    pub diagnostics: Option<DiagnosticsMode>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default)]
    pub stop_at: Vec<String>,
}

/// Fully layered settings, ready to drive discovery and the build.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub options: ProjectOptions,
    pub ignore: Vec<String>,
    pub recursive: bool,
    pub headers: Vec<PathBuf>,
    pub diagnostics: DiagnosticsMode,
}

/// Load `path`, or `cbuild.toml` from the current directory when `path` is
/// `None`. Only an explicitly named file is required to exist.
pub fn load_config(path: Option<&Path>) -> Result<CbuildConfig> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(CONFIG_FILE), false),
    };

    if !path.exists() {
        if required {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(CbuildConfig::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: CbuildConfig = toml::from_str(&raw).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            path.display()
        )
    })?;
    debug!(path = %path.display(), profiles = config.profile.len(), "loaded config");
    Ok(config)
}

impl CbuildConfig {
    /// `[build]` with the named profile laid over it.
    pub fn layered(&self, profile: Option<&str>) -> Result<BuildConfig> {
        let base = self.build.clone();
        match profile {
            None => Ok(base),
            Some(name) => {
                let overlay = self.profile.get(name).with_context(|| {
                    let mut known: Vec<&str> = self.profile.keys().map(String::as_str).collect();
                    known.sort_unstable();
                    format!(
                        "Unknown profile '{}' (available: {})",
                        name,
                        if known.is_empty() {
                            "none".to_string()
                        } else {
                            known.join(", ")
                        }
                    )
                })?;
                Ok(base.overlay(overlay.clone()))
            }
        }
    }

    /// A `[diagnostics]` table wins over the named built-in mode.
    pub fn diagnostic_filter(&self, mode: DiagnosticsMode) -> Result<Box<dyn DiagnosticFilter>> {
        match &self.diagnostics {
            Some(custom) => {
                let filter = PatternFilter::new(custom.drop.as_slice(), custom.stop_at.as_slice())
                    .context("Invalid pattern in [diagnostics]")?;
                Ok(Box::new(filter))
            }
            None => Ok(mode.into_filter()),
        }
    }
}

impl BuildConfig {
    /// Fields set in `top` replace those in `self`.
    pub fn overlay(self, top: BuildConfig) -> BuildConfig {
        BuildConfig {
            compiler: top.compiler.or(self.compiler),
            linker: top.linker.or(self.linker),
            output: top.output.or(self.output),
            build_dir: top.build_dir.or(self.build_dir),
            flags: top.flags.or(self.flags),
            link_flags: top.link_flags.or(self.link_flags),
            include_paths: top.include_paths.or(self.include_paths),
            library_paths: top.library_paths.or(self.library_paths),
            libraries: top.libraries.or(self.libraries),
            ignore: top.ignore.or(self.ignore),
            headers: top.headers.or(self.headers),
            recursive: top.recursive.or(self.recursive),
            concurrency: top.concurrency.or(self.concurrency),
            diagnostics: top.diagnostics.or(self.diagnostics),
        }
    }

    /// Fill in defaults. A concurrency of 0 means "one worker per core".
    pub fn resolve(self, cwd: &Path, force_rebuild: bool, execute: bool) -> ResolvedConfig {
        let concurrency = match self.concurrency {
            Some(n) if n > 0 => n,
            _ => default_concurrency(),
        };
        let build_dir = self.build_dir.as_deref().unwrap_or(DEFAULT_BUILD_DIR).trim();

        let unit = UnitSettings {
            compiler: self.compiler.unwrap_or_else(|| DEFAULT_COMPILER.to_string()),
            flags: self
                .flags
                .unwrap_or_else(|| DEFAULT_FLAGS.iter().map(|s| s.to_string()).collect()),
            build_dir: normalize_build_dir(build_dir, cwd),
            force_rebuild,
            include_paths: self.include_paths.unwrap_or_default(),
            library_paths: self.library_paths.unwrap_or_default(),
            libraries: self.libraries.unwrap_or_default(),
        };

        ResolvedConfig {
            options: ProjectOptions {
                output: self.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
                unit,
                linker: self.linker.filter(|l| !l.is_empty()),
                link_flags: self.link_flags,
                concurrency,
                execute,
            },
            ignore: self.ignore.unwrap_or_default(),
            recursive: self.recursive.unwrap_or(false),
            headers: self.headers.unwrap_or_default(),
            diagnostics: self.diagnostics.unwrap_or_default(),
        }
    }
}

pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
