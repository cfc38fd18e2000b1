use super::source::{FileKind, SourceFile};
use crate::error::BuildError;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// A source file paired with the artifact it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub source: SourceFile,
    pub output: PathBuf,
}

impl BuildTarget {
    /// Headers produce `<header>.gch` beside themselves; translation units
    /// produce `<build_dir>/<stem>.o`. `build_dir` is expected to be
    /// normalized already (see [`normalize_build_dir`]).
    pub fn new(source: SourceFile, build_dir: &Path) -> Self {
        let output = match source.kind {
            FileKind::Header => {
                let mut gch = source.path.as_os_str().to_owned();
                gch.push(".gch");
                PathBuf::from(gch)
            }
            FileKind::TranslationUnit => {
                let mut object = source.path.file_stem().unwrap_or_default().to_owned();
                object.push(".o");
                build_dir.join(object)
            }
        };
        Self { source, output }
    }

    /// `Ok(true)` when the output exists and its mtime is not older than the
    /// source's. The source is always stat'ed so a missing source is reported
    /// even on a forced rebuild.
    pub fn is_fresh(&self) -> Result<bool, BuildError> {
        let src_time = modified(&self.source.path).map_err(|_| BuildError::MissingSource {
            path: self.source.path.clone(),
        })?;
        match modified(&self.output) {
            Ok(out_time) => Ok(out_time >= src_time),
            Err(_) => Ok(false),
        }
    }

    pub fn ensure_source_exists(&self) -> Result<(), BuildError> {
        if fs::metadata(&self.source.path).is_err() {
            return Err(BuildError::MissingSource {
                path: self.source.path.clone(),
            });
        }
        Ok(())
    }
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Resolve a user-supplied build directory against `cwd`.
///
/// `./`, `build/` and `build/.` collapse to `cwd`, `cwd/build` and
/// `cwd/build` respectively; absolute paths are kept.
pub fn normalize_build_dir(raw: impl AsRef<Path>, cwd: &Path) -> PathBuf {
    let cleaned: PathBuf = raw
        .as_ref()
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if cleaned.as_os_str().is_empty() {
        cwd.to_path_buf()
    } else if cleaned.is_absolute() {
        cleaned
    } else {
        cwd.join(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_translation_unit_output_lives_in_build_dir() {
        let src = SourceFile::classify("src/net/socket.cpp").unwrap();
        let target = BuildTarget::new(src, Path::new("/tmp/out"));
        assert_eq!(target.output, PathBuf::from("/tmp/out/socket.o"));
    }

    #[test]
    fn test_header_output_sits_next_to_header() {
        let src = SourceFile::classify("include/util.hpp").unwrap();
        let target = BuildTarget::new(src, Path::new("/tmp/out"));
        assert_eq!(target.output, PathBuf::from("include/util.hpp.gch"));
    }

    #[test]
    fn test_normalize_build_dir() {
        let cwd = Path::new("/work");
        assert_eq!(normalize_build_dir("./", cwd), PathBuf::from("/work"));
        assert_eq!(normalize_build_dir("", cwd), PathBuf::from("/work"));
        assert_eq!(normalize_build_dir("build/", cwd), PathBuf::from("/work/build"));
        assert_eq!(normalize_build_dir("build/.", cwd), PathBuf::from("/work/build"));
        assert_eq!(normalize_build_dir("/abs/obj/", cwd), PathBuf::from("/abs/obj"));
    }

    #[test]
    fn test_freshness_follows_mtimes() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("a.cpp");
        fs::write(&src_path, "int main() {}").unwrap();
        let target = BuildTarget::new(SourceFile::classify(&src_path).unwrap(), dir.path());

        // No object yet
        assert!(!target.is_fresh().unwrap());

        fs::write(&target.output, "obj").unwrap();
        let now = SystemTime::now();
        set_mtime(&src_path, now - Duration::from_secs(10));
        set_mtime(&target.output, now);
        assert!(target.is_fresh().unwrap());

        // Equal mtimes still count as fresh
        set_mtime(&src_path, now);
        assert!(target.is_fresh().unwrap());

        set_mtime(&src_path, now + Duration::from_secs(10));
        assert!(!target.is_fresh().unwrap());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = BuildTarget::new(
            SourceFile::classify(dir.path().join("ghost.c")).unwrap(),
            dir.path(),
        );
        assert!(matches!(
            target.is_fresh(),
            Err(BuildError::MissingSource { .. })
        ));
        assert!(target.ensure_source_exists().is_err());
    }
}
