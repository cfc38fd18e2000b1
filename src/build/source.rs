use std::fmt;
use std::path::{Path, PathBuf};

/// How a file participates in the build. Decided once, by extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `.h` / `.hpp`, precompiled next to itself
    Header,
    /// `.c` / `.cpp`, compiled to an object and linked
    TranslationUnit,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "h" | "hpp" => Some(FileKind::Header),
            "c" | "cpp" => Some(FileKind::TranslationUnit),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Header => write!(f, "header"),
            FileKind::TranslationUnit => write!(f, "source"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

impl SourceFile {
    /// Classify `path`; `None` when the extension is not one we build.
    pub fn classify(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = FileKind::from_path(&path)?;
        Some(Self { path, kind })
    }

    pub fn is_header(&self) -> bool {
        self.kind == FileKind::Header
    }
}
