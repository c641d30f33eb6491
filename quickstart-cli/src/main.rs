use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod env;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "quickstart",
    version,
    about = "User CRUD API for container-platform deployments"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so env-backed flags see values from .env
    let dotenv = env::load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug })?;
    env::report(&dotenv);

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate => commands::run_migrate().await?,
    }

    Ok(())
}
