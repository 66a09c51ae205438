//! `graphpool` command line tool
//!
//! Opens a bounded pool of Neo4j connections, runs one command against it
//! and shuts the pool down before exiting.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use graphpool_connection::{
    ConnectionPool, DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_POOL_SIZE, PoolConfig,
};
use graphpool_core::{ConnectionTarget, Credentials};
use graphpool_driver_neo4j::Neo4jConnector;

use crate::logging::LoggingConfig;

#[derive(Parser, Debug)]
#[command(name = "graphpool", version, about = "Pooled Neo4j connections for class graph loading")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Directory for per-command log files
    #[arg(long, global = true, env = "GRAPHPOOL_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Log to the console only
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Keep logs off the console; command output is still printed
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// Bolt URI of the Neo4j server
    #[arg(long, global = true, env = "NEO4J_URI", default_value = "bolt://localhost:7687")]
    uri: String,

    /// User to authenticate as
    #[arg(long, global = true, env = "NEO4J_USER", default_value = "neo4j")]
    user: String,

    /// Password for the user
    #[arg(
        long,
        global = true,
        env = "NEO4J_PASSWORD",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    password: String,

    /// Database every session runs against
    #[arg(long, global = true, env = "NEO4J_DATABASE", default_value = "neo4j")]
    database: String,

    /// Number of connections opened up front
    #[arg(long, global = true, env = "NEO4J_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    pool_size: usize,

    /// How long to wait for a free connection, in milliseconds
    #[arg(
        long,
        global = true,
        env = "NEO4J_ACQUIRE_TIMEOUT_MS",
        default_value_t = DEFAULT_ACQUIRE_TIMEOUT_MS
    )]
    acquire_timeout_ms: u64,
}

impl ConnectionArgs {
    fn pool_config(&self) -> PoolConfig {
        let target = ConnectionTarget::new(
            self.uri.clone(),
            Credentials::new(self.user.clone(), self.password.clone()),
            self.database.clone(),
        );
        PoolConfig::new(target)
            .with_size(self.pool_size)
            .with_acquire_timeout_ms(self.acquire_timeout_ms)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the pool and verify every connection answers a query
    Check,

    /// Write classes from a JSON file into the graph
    Load {
        /// JSON array of classes
        #[arg(short, long)]
        input: PathBuf,

        /// Delete everything in the database first
        #[arg(long)]
        clean: bool,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Check => "check",
            Command::Load { .. } => "load",
        }
    }
}

impl Cli {
    fn logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::for_command(self.command.name());
        config.log_dir = self.log_dir.clone();
        config.enable_file_logs = !self.no_log_file;
        config.enable_console_logs = !self.quiet;
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be in place before clap reads the environment
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let _log_guard = match logging::init(cli.logging_config()) {
        Ok(guard) => guard,
        Err(e) => {
            // Logging isn't up yet
            eprintln!("FATAL: Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.connection.pool_config();
    tracing::info!(
        uri = %config.target().endpoint,
        database = %config.database(),
        size = config.size(),
        "opening connection pool"
    );

    let pool = Arc::new(ConnectionPool::new(Neo4jConnector::default()));
    if let Err(e) = pool.initialize(config).await {
        pool.shutdown().await;
        return Err(e).context("failed to initialize connection pool");
    }

    let result = match &cli.command {
        Command::Check => commands::check(&pool).await,
        Command::Load { input, clean } => commands::load(pool.clone(), input, *clean).await,
    };

    let report = pool.shutdown().await;
    for failure in report.failures() {
        tracing::warn!(error = %failure, "connection did not close cleanly");
    }
    result
}
