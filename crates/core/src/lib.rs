//! Script Runner Core Library
//!
//! This crate provides the core functionality for script-runner, a tool that
//! runs a parameterized script template against a selected file. Path-derived
//! placeholders such as `$(fileDirectory)` are resolved, the result is written
//! to a disposable script, and the script's output is streamed line by line to
//! an output sink while it runs.
//!
//! # Key Features
//!
//! - **Template Resolution**: `$(<context><suffix>)` placeholders for named path contexts
//! - **Materialized Scripts**: Uniquely named temporary scripts that never outlive a run
//! - **Streaming Execution**: Combined stdout/stderr delivered to a sink as it is produced
//! - **Owner Discovery**: Finds the project and solution files that own a selected file
//! - **Error Handling**: Comprehensive error types for all failure modes
//!
//! # Examples
//!
//! Running a selected script with its discovered contexts:
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use script_runner_core::config::RunnerConfig;
//! use script_runner_core::invocation::{Invocation, OwnerFiles};
//! use script_runner_core::sink::ConsoleSink;
//!
//! # async fn example() -> script_runner_core::error::Result<()> {
//! let config = RunnerConfig::default();
//! let owners = OwnerFiles::default();
//! let invocation = Invocation::for_selected_file(Path::new("build.sh"), &config, &owners)?;
//! let result = invocation.run(&config, Arc::new(ConsoleSink)).await?;
//! println!("exit code {}", result.exit_code);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod file_handling;
pub mod interpolation;
pub mod invocation;
pub mod project;
pub mod session;
pub mod sink;
