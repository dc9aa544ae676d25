//! Reading script templates and materializing resolved scripts on disk.
//!
//! A [`MaterializedScript`] owns its file: dropping it deletes the file, and
//! [`MaterializedScript::close`] deletes it while reporting failures.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::{Builder, TempPath};

use crate::config::RunnerConfig;
use crate::error::{Error, Result};

const SCRIPT_PREFIX: &str = "script-runner-";

/// Reads a script template from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] carrying the template path if the file cannot be read.
pub fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::io_error("template".to_string(), path.display().to_string(), e))
}

/// A resolved script written to a uniquely named temporary file.
#[derive(Debug)]
pub struct MaterializedScript {
    path: TempPath,
}

impl MaterializedScript {
    /// Writes `content` to a new file in the configured temp directory.
    ///
    /// The file gets the configured script extension, is made executable for
    /// the owner on Unix, and its handle is closed before this returns so the
    /// script can be executed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, written or made executable.
    /// Nothing is left on disk in that case.
    pub fn create(content: &str, config: &RunnerConfig) -> Result<Self> {
        let directory = config.temp_directory().unwrap_or_else(std::env::temp_dir);
        let io_error = |e| {
            Error::io_error(
                "materialized script".to_string(),
                directory.display().to_string(),
                e,
            )
        };

        let mut file = Builder::new()
            .prefix(SCRIPT_PREFIX)
            .suffix(config.script_extension())
            .tempfile_in(&directory)
            .map_err(io_error)?;

        file.write_all(content.as_bytes()).map_err(io_error)?;
        file.flush().map_err(io_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(0o700))
                .map_err(io_error)?;
        }

        let path = file.into_temp_path();
        debug!("Materialized script at `{}`", path.display());

        Ok(Self { path })
    }

    /// Takes ownership of an existing script file so it is deleted after use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a relative path cannot be made absolute.
    pub fn adopt(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let display = path.display().to_string();
        let path = TempPath::try_from_path(path)
            .map_err(|e| Error::io_error("adopted script".to_string(), display, e))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file. A file that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be removed.
    pub fn close(self) -> Result<()> {
        let display = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io_error("materialized script".to_string(), display, e)),
        }
    }
}
