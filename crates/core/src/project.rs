//! Discovery of the project or solution file that owns a selected file.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::debug;

use crate::error::{Error, Result};

fn compile_markers(markers: &[String]) -> Result<Vec<Pattern>> {
    markers
        .iter()
        .map(|marker| {
            Pattern::new(marker).map_err(|e| Error::pattern_error(marker.clone(), e))
        })
        .collect()
}

fn matching_file_in(directory: &Path, patterns: &[Pattern]) -> Option<PathBuf> {
    // Unreadable directories are skipped rather than aborting the walk.
    let entries = fs::read_dir(directory).ok()?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            patterns.iter().any(|pattern| pattern.matches(&name))
        })
        .map(|entry| entry.path())
        .collect();

    candidates.sort();
    candidates.into_iter().next()
}

/// Walks upward from `start` and returns the first file matching any marker glob.
///
/// `start` may be a file, in which case the walk begins in its directory.
/// Within one directory the alphabetically first match wins.
///
/// # Errors
///
/// Returns [`Error::Pattern`] if a marker is not a valid glob.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use script_runner_core::project::find_owning_file;
///
/// let project = find_owning_file(Path::new("/src/app/build.sh"), &["Cargo.toml".to_string()])?;
/// # Ok::<(), script_runner_core::error::Error>(())
/// ```
pub fn find_owning_file(start: &Path, markers: &[String]) -> Result<Option<PathBuf>> {
    let patterns = compile_markers(markers)?;
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut directory = if start.is_dir() {
        Some(start)
    } else {
        start.parent()
    };

    while let Some(current) = directory {
        if let Some(found) = matching_file_in(current, &patterns) {
            debug!("Found `{}` owning `{}`", found.display(), start.display());
            return Ok(Some(found));
        }
        directory = current.parent();
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn markers(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_finds_marker_in_same_directory() {
        let root = tempfile::tempdir().unwrap();
        File::create(root.path().join("app.csproj")).unwrap();
        let script = root.path().join("build.bat");
        File::create(&script).unwrap();

        let found = find_owning_file(&script, &markers(&["*.csproj"])).unwrap();
        assert_eq!(found, Some(root.path().join("app.csproj")));
    }

    #[test]
    fn test_walks_up_to_parent() {
        let root = tempfile::tempdir().unwrap();
        File::create(root.path().join("app.sln")).unwrap();
        let nested = root.path().join("src").join("web");
        fs::create_dir_all(&nested).unwrap();
        let script = nested.join("deploy.sh");
        File::create(&script).unwrap();

        let found = find_owning_file(&script, &markers(&["*.sln"])).unwrap();
        assert_eq!(found, Some(root.path().join("app.sln")));
    }

    #[test]
    fn test_nearest_match_wins() {
        let root = tempfile::tempdir().unwrap();
        File::create(root.path().join("Cargo.toml")).unwrap();
        let member = root.path().join("member");
        fs::create_dir_all(&member).unwrap();
        File::create(member.join("Cargo.toml")).unwrap();

        let found = find_owning_file(&member.join("run.sh"), &markers(&["Cargo.toml"])).unwrap();
        assert_eq!(found, Some(member.join("Cargo.toml")));
    }

    #[test]
    fn test_alphabetical_within_directory() {
        let root = tempfile::tempdir().unwrap();
        File::create(root.path().join("b.csproj")).unwrap();
        File::create(root.path().join("a.csproj")).unwrap();

        let found = find_owning_file(root.path(), &markers(&["*.csproj"])).unwrap();
        assert_eq!(found, Some(root.path().join("a.csproj")));
    }

    #[test]
    fn test_directories_are_not_matches() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("fake.csproj")).unwrap();

        let found = find_owning_file(&root.path().join("x.sh"), &markers(&["*.csproj"])).unwrap();
        assert_ne!(found, Some(root.path().join("fake.csproj")));
    }

    #[test]
    fn test_no_markers() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(find_owning_file(root.path(), &[]).unwrap(), None);
    }

    #[test]
    fn test_invalid_pattern() {
        let root = tempfile::tempdir().unwrap();
        let result = find_owning_file(root.path(), &markers(&["[unclosed"]));
        assert!(matches!(result, Err(Error::Pattern { .. })));
    }
}
