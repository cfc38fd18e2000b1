pub mod diagnostics;
pub mod process;
mod project;
mod source;
mod target;
mod unit;

pub use diagnostics::{DiagnosticFilter, DiagnosticsMode, PatternFilter, RawOutput};
pub use process::{CommandRunner, Invocation, SystemRunner, ToolOutput};
pub use project::{Project, ProjectOptions, ProjectReport, link_invocation};
pub use source::{FileKind, SourceFile};
pub use target::{BuildTarget, normalize_build_dir};
pub use unit::{BuildResult, UnitSettings, build_file, compile_invocation};
