//! Source file discovery.
//!
//! Collects files of one extension under a directory, optionally descending
//! into subdirectories. Hidden directories (`.git`, `.cache`, ...) are never
//! entered. Result order is whatever the filesystem hands back.

use crate::error::BuildError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Return every file under `path` (default: current directory) whose extension
/// matches `extension` case-insensitively. The leading dot is optional
/// (`".cpp"` and `"cpp"` are equivalent).
///
/// A file is dropped if its name contains any of `exclude`, compared
/// case-insensitively against the file name only, never the directory part.
pub fn files_with_extension(
    extension: &str,
    path: Option<&Path>,
    recursive: bool,
    exclude: &[String],
) -> Result<Vec<PathBuf>, BuildError> {
    let root = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().map_err(|e| BuildError::io(".", e))?,
    };
    let wanted = extension.trim_start_matches('.').to_lowercase();
    let exclude: Vec<String> = exclude
        .iter()
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
        .collect();

    let mut walker = WalkDir::new(&root).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden_dir(e)) {
        let entry = entry.map_err(|e| walk_error(&root, e))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if !has_extension(entry.path(), &wanted) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if let Some(hit) = exclude.iter().find(|e| name.contains(e.as_str())) {
            debug!(file = %entry.path().display(), pattern = %hit, "excluded by ignore pattern");
            continue;
        }
        files.push(entry.into_path());
    }

    debug!(root = %root.display(), extension = %wanted, count = files.len(), "discovered files");
    Ok(files)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase() == wanted)
        .unwrap_or(false)
}

fn walk_error(root: &Path, err: walkdir::Error) -> BuildError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = match err.into_io_error() {
        Some(io) => io,
        None => std::io::Error::other("filesystem loop detected"),
    };
    BuildError::io(path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn names(files: &[PathBuf]) -> HashSet<String> {
        files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_exclude_substring_filters_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["a.cpp", "b_test.cpp", "a.h"] {
            fs::write(dir.path().join(f), "").unwrap();
        }
        let exclude = vec!["test".to_string()];

        let mut found = files_with_extension(".cpp", Some(dir.path()), false, &exclude).unwrap();
        found.extend(files_with_extension(".h", Some(dir.path()), false, &exclude).unwrap());

        let expected: HashSet<String> = ["a.cpp", "a.h"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names(&found), expected);
    }

    #[test]
    fn test_exclude_ignores_directory_names() {
        let dir = tempfile::tempdir().unwrap();
        let tests_dir = dir.path().join("tests");
        fs::create_dir(&tests_dir).unwrap();
        fs::write(tests_dir.join("main.cpp"), "").unwrap();

        let found =
            files_with_extension(".cpp", Some(dir.path()), true, &["test".to_string()]).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_extension_and_exclude_are_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main.CPP"), "").unwrap();
        fs::write(dir.path().join("MyTEST.cpp"), "").unwrap();

        let found =
            files_with_extension(".Cpp", Some(dir.path()), false, &["Test".to_string()]).unwrap();
        assert_eq!(names(&found), HashSet::from(["Main.CPP".to_string()]));
    }

    #[test]
    fn test_non_recursive_stays_in_top_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("top.c"), "").unwrap();
        fs::write(dir.path().join("sub").join("deep.c"), "").unwrap();

        let flat = files_with_extension("c", Some(dir.path()), false, &[]).unwrap();
        assert_eq!(names(&flat), HashSet::from(["top.c".to_string()]));

        let deep = files_with_extension("c", Some(dir.path()), true, &[]).unwrap();
        assert_eq!(
            names(&deep),
            HashSet::from(["top.c".to_string(), "deep.c".to_string()])
        );
    }

    #[test]
    fn test_recursive_skips_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("hook.c"), "").unwrap();
        fs::write(dir.path().join("main.c"), "").unwrap();

        let found = files_with_extension(".c", Some(dir.path()), true, &[]).unwrap();
        assert_eq!(names(&found), HashSet::from(["main.c".to_string()]));
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let found = files_with_extension(".cpp", Some(dir.path()), true, &[]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_missing_directory_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = files_with_extension(".cpp", Some(missing.as_path()), false, &[]).unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }
}
