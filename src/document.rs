use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A document written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Absolute path of the written file.
    pub path: PathBuf,
    pub file_name: String,
    /// Absolute directory containing the file, with `..` and symlinks resolved.
    pub directory: PathBuf,
}

/// Wrap an HTML fragment in the fixed document shell.
pub fn wrap(fragment: &str) -> String {
    format!("<!DOCTYPE html><html>\n<meta charset=\"UTF-8\">\n<body>\n{fragment}</body></html>")
}

/// Write a finished document in one step.
pub fn write(path: &Path, html: &str) -> Result<Published> {
    let output_error = |source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    fs::write(path, html).map_err(output_error)?;

    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let directory = fs::canonicalize(parent).map_err(output_error)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = directory.join(&file_name);

    Ok(Published {
        path,
        file_name,
        directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Component;

    #[test]
    fn shell_is_fixed() {
        assert_eq!(
            wrap("<h1>Hi</h1>\n"),
            "<!DOCTYPE html><html>\n<meta charset=\"UTF-8\">\n<body>\n<h1>Hi</h1>\n</body></html>"
        );
    }

    #[test]
    fn write_reports_absolute_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");

        let published = write(&path, "<p>x</p>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>x</p>");
        assert_eq!(published.file_name, "out.html");
        assert!(published.directory.is_absolute());
        assert_eq!(published.path, published.directory.join("out.html"));
    }

    #[test]
    fn write_reports_resolved_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let path = dir.path().join("sub").join("..").join("out.html");

        let published = write(&path, "<p>x</p>").unwrap();
        assert!(
            published
                .directory
                .components()
                .all(|c| c != Component::ParentDir),
            "{}",
            published.directory.display()
        );
        assert_eq!(published.directory, fs::canonicalize(dir.path()).unwrap());
        assert_eq!(published.path, published.directory.join("out.html"));
        assert!(published.path.is_file());
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.html");

        let err = write(&path, "").unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }), "got {err:?}");
        assert!(err.to_string().contains("out.html"), "{err}");
    }
}
