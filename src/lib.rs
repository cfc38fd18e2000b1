//! # cbuild - Minimal Parallel C/C++ Build Driver
//!
//! cbuild finds C/C++ sources, compiles each one with an external compiler on
//! a bounded worker pool, skips any whose object is at least as new as the
//! source, and links the objects into a binary it can then run.
//!
//! There is no dependency graph: freshness is one mtime comparison per file,
//! and a changed header does not rebuild the sources that include it.
//!
//! ## Quick Start
//!
//! ```bash
//! # Build every .c/.cpp in the current directory and run the result
//! cbuild --run
//!
//! # Recursive, custom flags, 4 workers
//! cbuild --recursive --build-flags "-O2 -Wall" --build-dir build -j 4
//! ```
//!
//! ## Module Organization
//!
//! - [`discover`] - Source file discovery
//! - [`build`] - Unit builder, orchestration and process spawning
//! - [`config`] - Configuration parsing (`cbuild.toml`)
//! - [`error`] - Error taxonomy

/// Compilation, linking and the worker pool.
pub mod build;

/// Configuration file parsing (`cbuild.toml`).
pub mod config;

/// Directory walking with extension and exclude filters.
pub mod discover;

pub mod error;

/// Terminal UI utilities (tables, colors).
pub mod ui;

pub use error::BuildError;
