//! Input file discovery

use std::path::{Path, PathBuf};

use nomos_diag::{Diagnostic, ErrorKind};

/// Extension of nomos source files
pub const SOURCE_EXTENSION: &str = "csl";

/// Resolve the input path to an ordered list of source files.
///
/// A regular file is the single input regardless of extension; a directory
/// is walked (following symlinks, so loops are detected and reported) and
/// every `.csl` file is returned sorted lexicographically by full path.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>, Diagnostic> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(Diagnostic::error(
            ErrorKind::Io,
            format!("input path `{}` does not exist", path.display()),
        ));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|e| {
            Diagnostic::error(
                ErrorKind::Io,
                format!("failed to walk `{}`: {e}", path.display()),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    tracing::debug!(root = %path.display(), count = files.len(), "discovered source files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_is_returned_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.csl");
        std::fs::write(&file, "app: \"x\"\n").unwrap();
        assert_eq!(discover(&file).unwrap(), vec![file]);
    }

    #[test]
    fn directories_are_walked_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        for name in ["zeta.csl", "alpha.csl", "notes.txt", "sub/beta.csl"] {
            std::fs::write(dir.path().join(name), "x: \"1\"\n").unwrap();
        }
        let found = discover(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["alpha.csl", "sub/beta.csl", "zeta.csl"]);
    }

    #[test]
    fn missing_path_is_an_io_diagnostic() {
        let err = discover(Path::new("/no/such/dir")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        std::os::unix::fs::symlink(dir.path(), inner.join("loop")).unwrap();
        let err = discover(dir.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
    }
}
