use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cloudx::auth::KeyStore;
use cloudx::config::{DEFAULT_MASTER_KEY, ServerConfig};
use cloudx::server::dto::KeyResponse;
use cloudx::server::{AppState, create_router};
use cloudx::store::{SqliteStore, Store};
use cloudx::types::{ADMIN_USER_ID, Identity};

#[derive(Parser)]
#[command(name = "cloudx")]
#[command(about = "A multi-tenant bucket storage server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags below override its values
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the catalog database and bucket storage
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Master credential, overriding CLOUDX_MASTER_KEY
        #[arg(long)]
        master_key: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Issue an API key for a user, creating nothing else
    IssueKey {
        /// Data directory for the catalog database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Owner of the new key
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        display_name: Option<String>,

        /// Label for the key
        #[arg(long)]
        name: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// List every issued API key
    ListKeys {
        /// Data directory for the catalog database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    std::fs::create_dir_all(data_dir)?;

    let config = ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    };
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    Ok(store)
}

fn prompt_required(label: &str, value: Option<String>, non_interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    if non_interactive {
        bail!("--{} is required with --non-interactive", label.to_lowercase().replace(' ', "-"));
    }

    let value = inquire::Text::new(&format!("{label}:"))
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(inquire::validator::Validation::Invalid("Value cannot be empty".into()))
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(value.trim().to_string())
}

fn prompt_optional(label: &str, value: Option<String>, non_interactive: bool) -> anyhow::Result<Option<String>> {
    if value.is_some() || non_interactive {
        return Ok(value);
    }

    let value = inquire::Text::new(&format!("{label} (optional):")).prompt()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn run_issue_key(
    data_dir: &Path,
    user_id: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    name: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let user_id = prompt_required("User ID", user_id, non_interactive)?;
    if user_id == ADMIN_USER_ID {
        bail!("'{ADMIN_USER_ID}' is reserved for the master credential");
    }
    let email = prompt_optional("Email", email, non_interactive)?;
    let display_name = prompt_optional("Display name", display_name, non_interactive)?;
    let name = prompt_required("Name", name, non_interactive)?;

    let store = open_store(data_dir)?;
    // Issuing never consults the master credential.
    let keys = KeyStore::new(Arc::new(store), String::new());

    let mut owner = Identity::user(user_id, email);
    owner.display_name = display_name;
    let key = keys.issue(&owner, &name)?;

    println!();
    println!("========================================");
    println!("API key for '{}' (save this, it won't be shown again):", key.owner_id);
    println!();
    println!("  {}", key.secret);
    println!();
    println!("========================================");
    println!();

    Ok(())
}

fn run_list_keys(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let keys: Vec<KeyResponse> = store
        .list_api_keys(None)?
        .into_iter()
        .map(KeyResponse::from)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    if keys.is_empty() {
        println!("No API keys issued");
        return Ok(());
    }

    println!("{:<16} {:<20} {:<24} {:<20} LAST USED", "KEY", "OWNER", "NAME", "CREATED");
    for key in keys {
        println!(
            "{:<16} {:<20} {:<24} {:<20} {}",
            key.preview,
            key.owner_id,
            key.name,
            key.created_at.format("%Y-%m-%d %H:%M:%S"),
            key.last_used_at
                .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        );
    }

    Ok(())
}

async fn run_serve(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    master_key: Option<String>,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    }
    .with_env();

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if let Some(master_key) = master_key {
        config.master_key = master_key;
    }
    config.validate()?;

    if config.uses_default_master_key() {
        warn!(
            "Using the built-in master key '{DEFAULT_MASTER_KEY}'. Set CLOUDX_MASTER_KEY before exposing this server."
        );
    }

    let state = Arc::new(AppState::from_config(&config)?);
    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Data directory: {}", config.data_dir.display());
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cloudx=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::IssueKey {
                data_dir,
                user_id,
                email,
                display_name,
                name,
                non_interactive,
            } => {
                run_issue_key(&data_dir, user_id, email, display_name, name, non_interactive)?;
            }
            AdminCommands::ListKeys { data_dir, json } => {
                run_list_keys(&data_dir, json)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            master_key,
        } => {
            run_serve(config, host, port, data_dir, master_key).await?;
        }
    }

    Ok(())
}
