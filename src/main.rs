use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gitr_server::cli::{RepoCommands, run_repo_create, run_repo_list, run_repo_show};
use gitr_server::config::ServerConfig;
use gitr_server::server::{AppState, create_router};
use gitr_server::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "gitr-server")]
#[command(about = "Sync server for versioned conversation snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags given on the command line take precedence
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<String>,

        /// Maximum push body size in megabytes
        #[arg(long)]
        max_push_mb: Option<usize>,
    },

    /// Repository management against a local data directory
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: data_dir.into(),
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!("Initialized database at {}", db_path.display());
    Ok(())
}

fn resolve_serve_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<String>,
    max_push_mb: Option<usize>,
) -> anyhow::Result<ServerConfig> {
    let mut resolved = match config {
        Some(path) => ServerConfig::load(&path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = host {
        resolved.host = host;
    }
    if let Some(port) = port {
        resolved.port = port;
    }
    if let Some(data_dir) = data_dir {
        resolved.data_dir = data_dir.into();
    }
    if let Some(mb) = max_push_mb {
        resolved.max_push_bytes = mb.saturating_mul(1024 * 1024);
    }

    Ok(resolved)
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    info!("Using database at {}", config.db_path().display());

    let state = Arc::new(
        AppState::new(Arc::new(store)).with_max_push_bytes(config.max_push_bytes),
    );

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gitr_server=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => run_init(data_dir)?,
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            max_push_mb,
        } => {
            let config = resolve_serve_config(config, host, port, data_dir, max_push_mb)?;
            run_serve(config).await?;
        }
        Commands::Repo { command } => match command {
            RepoCommands::Create {
                name,
                data_dir,
                json,
            } => run_repo_create(&data_dir, &name, json)?,
            RepoCommands::List { data_dir, json } => run_repo_list(&data_dir, json)?,
            RepoCommands::Show { id, data_dir, json } => run_repo_show(&data_dir, &id, json)?,
        },
    }

    Ok(())
}
