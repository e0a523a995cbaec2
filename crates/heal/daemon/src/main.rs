//! Heal Daemon - access-controlled front for the Heal portal
//!
//! The daemon provides:
//! - Edge gate on every request (authentication, onboarding, optional role scope)
//! - Auth endpoints for the current principal and onboarding
//! - Identity webhook relay into the profile mirror

use clap::{Parser, Subcommand};
use heal_daemon::config::DaemonConfig;
use heal_daemon::error::{DaemonError, DaemonResult};
use heal_daemon::server::Server;
use heal_identity::{IdentityProvider, LocalIdentityProvider};
use heal_types::{Principal, PrincipalId, PrincipalMetadata, Role};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Heal Daemon CLI
#[derive(Parser)]
#[command(name = "heald")]
#[command(about = "Heal Daemon - role-based access control for the Heal portal", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HEAL_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "HEAL_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "HEAL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "HEAL_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daemon (default)
    Serve,

    /// Print a session token signed with the configured seed
    MintSession {
        /// Principal id
        #[arg(long)]
        user: String,

        /// Role to embed in the session
        #[arg(long)]
        role: Option<String>,

        /// Mark onboarding as complete
        #[arg(long)]
        onboarded: bool,
    },
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            println!(
                r#"
  _   _            _
 | | | | ___  __ _| |
 | |_| |/ _ \/ _` | |
 |  _  |  __/ (_| | |
 |_| |_|\___|\__,_|_|

  Heal - Portal Access Daemon
  Version: {}
  Listening: {}
"#,
                env!("CARGO_PKG_VERSION"),
                config.server.listen_addr
            );

            let server = Server::new(config).await?;
            server.run().await
        }
        Command::MintSession {
            user,
            role,
            onboarded,
        } => mint_session(&config, user, role, onboarded).await,
    }
}

async fn mint_session(
    config: &DaemonConfig,
    user: String,
    role: Option<String>,
    onboarded: bool,
) -> DaemonResult<()> {
    if config.identity.signing_seed.is_none() {
        return Err(DaemonError::Config(
            "mint-session requires identity.signing_seed".to_string(),
        ));
    }

    let role = role
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    let provider = LocalIdentityProvider::new(config.identity.session_issuer()?);
    let id = PrincipalId::new(user);
    provider
        .register(Principal::new(id.clone()).with_metadata(PrincipalMetadata {
            role,
            onboarding_complete: onboarded,
        }))
        .await
        .map_err(|e| DaemonError::Identity(e.to_string()))?;

    let token = provider
        .issue_session(&id)
        .await
        .map_err(|e| DaemonError::Identity(e.to_string()))?;

    tracing::info!(principal_id = %id, role = ?role, onboarded, "Minted session");
    println!("{}", token);
    Ok(())
}
