use std::{
    fmt,
    path::{Path, PathBuf},
};

#[derive(Debug)]
pub enum InputError {
    NotFound(PathBuf),
    ReadDir(walkdir::Error),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "The given path does not exist: {}", path.display()),
            Self::ReadDir(e) => write!(f, "Read log directory failed: {}", e),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::ReadDir(e) => Some(e),
        }
    }
}

/// Resolve the user's path into the log files to analyze.
///
/// A file is taken as is. For a directory, the regular files directly inside
/// it whose name ends with `.<extension>` are returned, sorted by name.
pub fn collect_log_files(path: &Path, extension: &str) -> Result<Vec<PathBuf>, InputError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let suffix = format!(".{}", extension);
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(InputError::ReadDir)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matched = entry
            .file_name()
            .to_str()
            .map_or(false, |s| s.ends_with(&suffix));
        if matched {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        tracing::warn!("No *{} files found in {}", suffix, path.display());
    } else {
        tracing::debug!("Log files: {:?}", files);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use test_log::test;

    #[test]
    fn test_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("access.txt");
        fs::write(&file, "").unwrap();
        // extension is only checked inside directories
        assert_eq!(collect_log_files(&file, "log").unwrap(), vec![file]);
    }

    #[test]
    fn test_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.log", "a.log", "notes.txt", "c.log.gz"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.log")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.log"), "").unwrap();

        let files = collect_log_files(dir.path(), "log").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.log"), dir.path().join("b.log")]
        );

        let files = collect_log_files(dir.path(), "gz").unwrap();
        assert_eq!(files, vec![dir.path().join("c.log.gz")]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_log_files(dir.path(), "log").unwrap().is_empty());
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = collect_log_files(&missing, "log").unwrap_err();
        assert!(matches!(err, InputError::NotFound(ref p) if *p == missing));
        assert!(err.to_string().contains("does not exist"));
    }
}
