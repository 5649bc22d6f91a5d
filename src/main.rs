use clap::Parser;
use colored::Colorize;
use examplan::cli::{Cli, Commands};
use examplan::commands;
use examplan::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> examplan::Result<()> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Generate {
            input,
            caller,
            proposer,
            json,
        } => commands::generate(config, &input, &caller, proposer, json).await,
        Commands::Serve { bind } => commands::serve(config, bind).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "examplan=debug" } else { "examplan=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // EXAMPLAN_LOG_FORMAT=json switches to structured output for log
    // shippers; the default stays human-readable.
    let json_logs = std::env::var("EXAMPLAN_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // Logs go to stderr; stdout is reserved for command output so that
    // `generate --json` stays machine-readable.
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
