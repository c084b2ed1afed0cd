//! Trivy build monitor CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trivy_monitor::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config_path).await,
        Commands::Status => {
            init_cli_logging();
            commands::status::execute(config_path, cli.json).await
        }
        Commands::ClearLock => {
            init_cli_logging();
            commands::lock::execute(config_path, cli.json).await
        }
    };

    if let Err(err) = result {
        trivy_monitor::cli::handle_error(err, cli.json);
    }
}

/// Quiet stderr logging for one-shot commands; `serve` configures its own.
fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
