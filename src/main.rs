mod cli;
mod dispatcher;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use trackfolio::config::AppConfig;
use trackfolio::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.storage.db_path = Some(db);
    }

    let session = Session::resolve(cli.user.as_deref(), config, cli.json);
    debug!("Running as user {}", session.user_id);

    dispatcher::dispatch_command(cli.command, &session).await
}
