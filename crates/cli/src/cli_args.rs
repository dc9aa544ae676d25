//! Command-line argument parsing.
//!
//! This module defines the command-line interface structure using the `clap` crate.

use clap::Parser;

/// Command-line arguments for the `sr` binary.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use script_runner_cli::cli_args::Args;
///
/// let args = Args::parse_from(["sr", "build.sh", "-x", "outDir=/tmp/out"]);
/// assert_eq!(args.contexts, vec!["outDir=/tmp/out"]);
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(term_width = 0)] // Just to make testing across clap features easier
pub struct Args {
    /// Path to the runner config file YAML.
    ///
    /// If not provided, defaults to `~/.script-runner/config.yml`.
    #[arg(long, short = 'c')]
    pub config_path: Option<String>,

    /// Bind `file` to this path instead of the script itself.
    #[arg(long, short = 'f')]
    pub file: Option<String>,

    /// Project file bound to `projectFile`. Discovered from the script's directory if omitted.
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Solution file bound to `solutionFile`. Discovered from the script's directory if omitted.
    #[arg(long, short = 's')]
    pub solution: Option<String>,

    /// Extra contexts in the format name=path.
    ///
    /// Multiple contexts can be provided with repeated `-x` flags and are
    /// resolved in the order given.
    ///
    /// # Examples
    /// ```bash
    /// sr publish.sh -x outDir=./dist -x manifest=./app.json
    /// ```
    #[arg(long = "context", short = 'x', action = clap::ArgAction::Append)]
    pub contexts: Vec<String>,

    /// Directory to run the script in. Defaults to the script's directory.
    #[arg(long, short = 'w')]
    pub working_directory: Option<String>,

    /// Print the resolved script without running it.
    #[arg(long, short = 'd', action)]
    pub dry_run: bool,

    /// The script template to resolve and run.
    pub script: String,
}
