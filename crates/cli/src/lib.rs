//! Script Runner CLI Library
//!
//! This crate provides the command-line interface for script-runner. It turns
//! command-line arguments into an invocation, resolves the script template,
//! runs it while printing its output, and exits with the script's exit code.
//!
//! # Architecture
//!
//! - [`cli_args`]: Command-line argument parsing
//! - [`arguments`]: Context parsing and invocation assembly
//!
//! # Examples
//!
//! ```bash
//! # Run a script; projectFile and solutionFile are discovered
//! sr tools/build.sh
//!
//! # Bind `file` to another file and add a custom context
//! sr tools/lint.sh --file src/main.cs -x outDir=./artifacts
//!
//! # Dry run: print the resolved script only
//! sr --dry-run tools/build.sh
//! ```

pub mod arguments;
pub mod cli_args;

/// Exit status used when the run is interrupted with Ctrl-C.
pub const INTERRUPTED_EXIT_STATUS: u8 = 130;

/// Maps a script exit code onto a process exit status, if it fits in one.
pub fn exit_status(exit_code: i32) -> Option<u8> {
    u8::try_from(exit_code).ok()
}
