mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bankwatch_core::Controller;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Summary period for `summary --watch` when neither flag nor profile sets one.
const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a store connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "bankwatch", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let mut controller_config = config::build_controller_config(&cli.global)?;
            controller_config.refresh_interval_secs = 0;
            controller_config.summary_interval = match &cmd {
                Command::Summary(args) if args.watch => args
                    .interval
                    .map(Duration::from_secs)
                    .filter(|d| !d.is_zero())
                    .unwrap_or(if controller_config.summary_interval.is_zero() {
                        DEFAULT_WATCH_INTERVAL
                    } else {
                        controller_config.summary_interval
                    }),
                _ => Duration::ZERO,
            };

            let controller = Controller::new(controller_config)?;
            commands::util::connect(&controller, &cli.global).await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &controller, &cli.global).await;
            controller.disconnect().await;
            result
        }
    }
}
