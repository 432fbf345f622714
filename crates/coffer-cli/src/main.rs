use std::process::ExitCode;

use clap::Parser;
use coffer_cli::cli_args::Cli;
use coffer_cli::cli_command::{describe_error, run};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.verbose) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(event = "command_failed", error = %format!("{err:#}"));
            eprintln!("error: {}", describe_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
