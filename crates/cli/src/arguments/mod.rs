//! Argument processing for the script-runner CLI.
//!
//! This module turns the raw command-line values into the pieces the core
//! needs:
//! - **Extra contexts**: `-x name=path` pairs, validated and kept in order
//! - **Invocation**: the selected script with its owner files, contexts and
//!   working directory

pub mod processing;

pub use processing::{build_invocation, parse_contexts};
