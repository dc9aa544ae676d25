//! One end-to-end run: read the template, resolve it, materialize it and run it.

use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use crate::config::RunnerConfig;
use crate::context::{normalize_path, VariableContext, FILE, PROJECT_FILE, SOLUTION_FILE};
use crate::error::{Error, Result};
use crate::file_handling::{read_template, MaterializedScript};
use crate::interpolation;
use crate::project::find_owning_file;
use crate::session::{ExecutionResult, ScriptSession};
use crate::sink::OutputSink;

/// Makes `path` absolute against the current directory and folds `.` and `..`
/// segments, without touching the filesystem.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map(|absolute| normalize_path(&absolute))
        .map_err(|e| Error::io_error("selected".to_string(), path.display().to_string(), e))
}

/// Owner files supplied by the caller instead of being discovered.
#[derive(Debug, Clone, Default)]
pub struct OwnerFiles {
    pub solution: Option<PathBuf>,
    pub project: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    template_path: PathBuf,
    contexts: Vec<VariableContext>,
    working_directory: PathBuf,
}

impl Invocation {
    pub fn new(template_path: impl Into<PathBuf>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            contexts: Vec::new(),
            working_directory: working_directory.into(),
        }
    }

    /// Builds the invocation for a selected script file.
    ///
    /// The selected file is the template and is bound to `file`. The owning
    /// solution and project files come from `owners` or, when not given there,
    /// are discovered from the configured markers. They are bound to
    /// `solutionFile` and `projectFile`; a role with no file is left out.
    /// The script runs in the selected file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be made absolute or a marker is not a valid glob.
    pub fn for_selected_file(
        selected: &Path,
        config: &RunnerConfig,
        owners: &OwnerFiles,
    ) -> Result<Self> {
        let selected = absolute_path(selected)?;
        let working_directory = selected
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                Error::Misc(format!("`{}` has no parent directory", selected.display()))
            })?;

        let mut invocation = Self::new(&selected, working_directory);

        for (name, given, markers) in [
            (SOLUTION_FILE, &owners.solution, &config.solution_markers),
            (PROJECT_FILE, &owners.project, &config.project_markers),
        ] {
            let owner = match given {
                Some(path) => Some(absolute_path(path)?),
                None => find_owning_file(&selected, markers)?,
            };

            match owner {
                Some(owner) => invocation = invocation.with_context(name, owner),
                None => warn!("No {name} found for `{}`", selected.display()),
            }
        }

        Ok(invocation.with_context(FILE, selected))
    }

    /// Adds a context, replacing any earlier context with the same name in place.
    pub fn with_context(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        let context = VariableContext::new(name, path);
        match self.contexts.iter_mut().find(|c| c.name() == name) {
            Some(existing) => *existing = context,
            None => self.contexts.push(context),
        }
        self
    }

    pub fn with_working_directory(mut self, working_directory: impl Into<PathBuf>) -> Self {
        self.working_directory = working_directory.into();
        self
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn contexts(&self) -> &[VariableContext] {
        &self.contexts
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Reads the template and resolves every placeholder the contexts know about.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be read.
    pub fn resolve(&self) -> Result<String> {
        let template = read_template(&self.template_path)?;
        Ok(interpolation::resolve(&template, &self.contexts))
    }

    /// Resolves, materializes and runs the script, streaming output to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be read, the script cannot be
    /// written, or the process cannot be launched. The script's own exit code
    /// is returned in the result, never as an error.
    pub async fn run(
        &self,
        config: &RunnerConfig,
        sink: Arc<dyn OutputSink>,
    ) -> Result<ExecutionResult> {
        let resolved = self.resolve()?;
        for token in interpolation::unresolved_placeholders(&resolved) {
            warn!("Unresolved placeholder `{token}` left in script");
        }

        if !self.working_directory.is_dir() {
            return Err(Error::launch_error(
                self.template_path.display().to_string(),
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "working directory `{}` does not exist",
                        self.working_directory.display()
                    ),
                ),
            ));
        }

        let script = MaterializedScript::create(&resolved, config)?;
        info!(
            "Running `{}` as `{}`",
            self.template_path.display(),
            script.path().display()
        );

        ScriptSession::new(script, &self.working_directory)
            .with_config(config)
            .run(sink)
            .await
    }
}

impl Display for Invocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.template_path.display())?;
        for context in &self.contexts {
            write!(formatter, "\n\t{context}")?;
        }
        Ok(())
    }
}
