use std::process::ExitCode;

use clap::Parser;
use engine_logging::engine_error;
use shorts_cli::app;
use shorts_cli::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = engine_logging::initialize(cli.log.destination(), cli.log_level) {
        eprintln!("Warning: could not set up logging: {err}");
    }

    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("shorts error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
