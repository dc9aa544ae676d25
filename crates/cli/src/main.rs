use clap::Parser;
use log::{debug, warn};
use script_runner_cli::arguments::build_invocation;
use script_runner_cli::cli_args::Args;
use script_runner_cli::{exit_status, INTERRUPTED_EXIT_STATUS};
use script_runner_core::config;
use script_runner_core::error::Result;
use script_runner_core::sink::{ConsoleSink, OutputSink};
use std::process::ExitCode;
use std::sync::Arc;

async fn execute() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = config::get_config_path(&args.config_path);
    debug!("Config path: `{}`", config_path);
    let runner_config = config::load_config(&config_path)?;

    let invocation = build_invocation(&args, &runner_config)?;

    if args.dry_run {
        println!("{}", invocation.resolve()?);
        println!("Dry run is specified, exiting without executing.");
        return Ok(ExitCode::SUCCESS);
    }

    let sink: Arc<dyn OutputSink> = Arc::new(ConsoleSink);

    // Dropping the run future on Ctrl-C kills the script and deletes its file.
    tokio::select! {
        result = invocation.run(&runner_config, sink) => {
            let result = result?;
            Ok(exit_status(result.exit_code).map_or(ExitCode::FAILURE, ExitCode::from))
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping script");
            Ok(ExitCode::from(INTERRUPTED_EXIT_STATUS))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match execute().await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
