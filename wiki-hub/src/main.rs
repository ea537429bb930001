use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wiki_hub::api::{self, AppState};
use wiki_hub::config::Config;
use wiki_hub_core::auth::{hash_password, AuthGate, UserDirectory};
use wiki_hub_core::events::EventBus;
use wiki_hub_core::relocation::{recover_pending, Relocator};

#[derive(Parser)]
#[command(name = "wiki-hub")]
#[command(about = "Self-hosted wiki with filesystem-backed documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, overrides WIKI_BIND
        #[arg(short, long)]
        addr: Option<String>,

        /// Wiki root directory, overrides WIKI_ROOT_DIR
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Print an argon2 hash for the users file
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { addr, root } => {
            let mut config = Config::from_env(root.as_deref())?;
            if let Some(addr) = addr {
                config.bind = addr;
            }
            serve(config).await?;
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let layout = config.layout();
    std::fs::create_dir_all(layout.documents_root())
        .with_context(|| format!("creating {}", layout.documents_root().display()))?;

    let report = recover_pending(&layout, config.move_options());
    if report.replayed + report.discarded + report.unreadable > 0 {
        info!(
            replayed = report.replayed,
            discarded = report.discarded,
            unreadable = report.unreadable,
            "recovered interrupted relocations"
        );
    }
    for warning in &report.warnings {
        warn!(%warning, "secondary store still out of place after recovery");
    }

    let users = UserDirectory::load(&config.users_file)?;
    let state = AppState {
        gate: AuthGate::in_memory(),
        verifier: Arc::new(users),
        relocator: Arc::new(Relocator::new(layout, config.move_options())),
        events: EventBus::new(),
        cookies: config.cookie_policy(),
    };
    if config.allow_insecure_cookies {
        warn!("session cookies are sent without the Secure flag");
    }

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!("Listening on {}", config.bind);
    axum::serve(listener, api::router(state)).await?;
    Ok(())
}
