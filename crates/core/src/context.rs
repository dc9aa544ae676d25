//! Named path bindings used to resolve placeholders in script templates.
//!
//! A [`VariableContext`] ties a logical role such as `file` or `projectFile` to
//! a path. Every context yields five values, one per [`Suffix`], which are
//! derived lexically from the path without touching the filesystem.

use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Context name for the solution file that owns the selected file.
pub const SOLUTION_FILE: &str = "solutionFile";
/// Context name for the project file that owns the selected file.
pub const PROJECT_FILE: &str = "projectFile";
/// Context name for the selected file itself.
pub const FILE: &str = "file";

/// The kinds of value that can be derived from a context's path.
///
/// The order of [`Suffix::ALL`] is the order in which the resolver applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suffix {
    /// File name without its extension, `$(file)`.
    Name,
    /// File name including the extension, `$(fileWithExtension)`.
    WithExtension,
    /// Extension with its leading dot, `$(fileExtension)`.
    Extension,
    /// Containing directory, `$(fileDirectory)`.
    Directory,
    /// The full path, `$(fileFullPath)`.
    FullPath,
}

impl Suffix {
    pub const ALL: [Suffix; 5] = [
        Suffix::Name,
        Suffix::WithExtension,
        Suffix::Extension,
        Suffix::Directory,
        Suffix::FullPath,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Suffix::Name => "",
            Suffix::WithExtension => "WithExtension",
            Suffix::Extension => "Extension",
            Suffix::Directory => "Directory",
            Suffix::FullPath => "FullPath",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableContext {
    name: String,
    path: PathBuf,
}

impl VariableContext {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The literal token this context answers to for `suffix`, e.g. `$(fileDirectory)`.
    pub fn placeholder(&self, suffix: Suffix) -> String {
        format!("$({}{})", self.name, suffix.as_str())
    }

    /// Computes the value for `suffix` from the normalized path. Missing
    /// components produce an empty string.
    pub fn derive(&self, suffix: Suffix) -> String {
        let path = normalize_path(&self.path);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, extension) = split_extension(&file_name);

        match suffix {
            Suffix::Name => stem.to_string(),
            Suffix::WithExtension => file_name.clone(),
            Suffix::Extension => extension.to_string(),
            Suffix::Directory => path
                .parent()
                .map(|parent| parent.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Suffix::FullPath => path.to_string_lossy().into_owned(),
        }
    }
}

/// Splits a file name at its last `.`.
///
/// Everything from that dot on is the extension, so `.bashrc` has an empty
/// name. A trailing dot is not an extension: `c.` gives `("c", "")`.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() => (&file_name[..dot], &file_name[dot..]),
        Some(dot) => (&file_name[..dot], ""),
        None => (file_name, ""),
    }
}

/// Removes `.` segments and folds `..` into its parent, without touching the
/// filesystem. `..` above the root is dropped; leading `..` of a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }

    normalized
}

impl Display for VariableContext {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} = {}", self.name, self.path.display())
    }
}

/// Checks that a context name can appear inside a `$(...)` token.
///
/// # Errors
///
/// Returns [`Error::ContextName`] for empty names and names containing `$`, `(` or `)`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['$', '(', ')']) {
        return Err(Error::ContextName(name.to_string()));
    }

    Ok(())
}
