use crate::cli_args::Args;
use indexmap::IndexMap;
use log::debug;
use script_runner_core::config::RunnerConfig;
use script_runner_core::context::{validate_name, FILE};
use script_runner_core::error::Error::ContextFormat;
use script_runner_core::error::Result;
use script_runner_core::invocation::{absolute_path, Invocation, OwnerFiles};
use std::path::{Path, PathBuf};

/// Parse extra contexts in the format name=path.
///
/// Only the first `=` separates the name from the path, so paths may contain `=`.
/// When a name is repeated the last path wins but the first position is kept.
///
/// # Errors
///
/// Returns an error if an entry has no `=`, an empty path, or an invalid name.
pub fn parse_contexts(raw_contexts: &[String]) -> Result<IndexMap<String, PathBuf>> {
    let mut contexts = IndexMap::new();

    for raw in raw_contexts {
        let Some((name, path)) = raw.split_once('=') else {
            return Err(ContextFormat(raw.to_string()));
        };

        if path.is_empty() {
            return Err(ContextFormat(raw.to_string()));
        }

        validate_name(name)?;
        let _ = contexts.insert(name.to_string(), PathBuf::from(path));
    }

    Ok(contexts)
}

fn absolute_option(path: Option<&String>) -> Result<Option<PathBuf>> {
    path.map(|path| absolute_path(Path::new(path))).transpose()
}

/// Build the invocation described by the command line.
///
/// Explicit `--project`/`--solution` paths replace discovery, `--file` rebinds
/// `file`, and extra contexts are appended after the built-in ones. An extra
/// context that reuses a built-in name replaces it.
///
/// # Errors
///
/// Returns an error if a context is malformed, a path cannot be made absolute,
/// or owner discovery fails.
pub fn build_invocation(args: &Args, config: &RunnerConfig) -> Result<Invocation> {
    let owners = OwnerFiles {
        solution: absolute_option(args.solution.as_ref())?,
        project: absolute_option(args.project.as_ref())?,
    };

    let mut invocation = Invocation::for_selected_file(Path::new(&args.script), config, &owners)?;

    if let Some(file) = absolute_option(args.file.as_ref())? {
        invocation = invocation.with_context(FILE, file);
    }

    for (name, path) in parse_contexts(&args.contexts)? {
        invocation = invocation.with_context(&name, absolute_path(&path)?);
    }

    if let Some(working_directory) = absolute_option(args.working_directory.as_ref())? {
        invocation = invocation.with_working_directory(working_directory);
    }

    debug!("Invocation: {invocation}");
    Ok(invocation)
}
