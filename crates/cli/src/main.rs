mod seed;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    sqlx::sqlite::SqlitePoolOptions,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {chirp_gateway::AppState, chirp_store::SqliteMessageStore};

#[derive(Parser)]
#[command(name = "chirp", about = "chirp — webhook-mirroring chat server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to.
    #[arg(long, global = true, default_value = "127.0.0.1", env = "CHIRP_BIND")]
    bind: String,

    /// Port to listen on.
    #[arg(long, global = true, default_value_t = 8080, env = "CHIRP_PORT")]
    port: u16,

    /// SQLite database URL.
    #[arg(
        long,
        global = true,
        default_value = "sqlite:chirp.db?mode=rwc",
        env = "CHIRP_DATABASE_URL"
    )]
    database_url: String,

    /// Webhook subscription verify token.
    #[arg(long, global = true, env = "CHIRP_VERIFY_TOKEN")]
    verify_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default when no subcommand is provided).
    Serve,
    /// Clear the store and replay webhook payload files into it.
    Seed {
        /// Directory of *.json payload files; built-in samples when omitted.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&cli.database_url)
        .await?;
    chirp_store::run_migrations(&pool).await?;
    let store = Arc::new(SqliteMessageStore::with_pool(pool));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = AppState::new(store, cli.verify_token.clone());
            chirp_gateway::serve(&cli.bind, cli.port, state).await
        },
        Commands::Seed { dir } => seed::run(store, dir.as_deref()).await,
    }
}
