use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kindred::{cli, config, server};

#[derive(Parser)]
#[command(name = "kindred", version, about = "Gamified companion chat server")]
struct Cli {
    /// Config file (defaults to ~/.kindred/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Export the whole store as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Replace the store with an exported JSON document
    Import {
        file: PathBuf,
        /// Treat an unreadable or corrupt file as empty instead of failing
        #[arg(long)]
        lenient: bool,
    },
    /// Show store statistics
    Stats,
    /// Show one user's state
    Inspect { user_id: String },
    /// Delete all user state
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::KindredConfig::load_from(path)?,
        None => config::KindredConfig::load()?,
    };

    // Logs go to stderr so stdout stays clean for export output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Export { out } => cli::export::export(&config, out.as_deref())?,
        Command::Import { file, lenient } => cli::import::import(&config, &file, lenient)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Inspect { user_id } => cli::inspect::inspect(&config, &user_id)?,
        Command::Reset => cli::reset::reset(&config)?,
    }

    Ok(())
}
