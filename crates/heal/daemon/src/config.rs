//! Configuration for heal-daemon

use crate::error::{DaemonError, DaemonResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use heal_identity::{AdminCode, SessionIssuer, DEFAULT_SESSION_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Identity provider configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Access control configuration
    #[serde(default)]
    pub access: AccessConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            max_body_size: default_max_body_size(),
        }
    }
}

/// Storage configuration for the profile mirror
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base64 of the 32-byte Ed25519 seed. A random key is used when unset,
    /// so sessions do not survive a restart.
    #[serde(default)]
    pub signing_seed: Option<String>,

    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,

    /// Webhook signing secret (`whsec_<base64>`). Webhooks are refused when unset.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Admin authorization code. Admin onboarding is closed when unset.
    #[serde(default)]
    pub admin_code: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            signing_seed: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            webhook_secret: None,
            admin_code: None,
        }
    }
}

impl IdentityConfig {
    /// Build the session issuer from the configured seed
    pub fn session_issuer(&self) -> DaemonResult<SessionIssuer> {
        let issuer = match self.signing_seed.as_deref().filter(|s| !s.is_empty()) {
            Some(encoded) => {
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| DaemonError::Config(format!("Invalid signing seed: {}", e)))?;
                let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    DaemonError::Config(format!(
                        "Signing seed must be 32 bytes, got {}",
                        bytes.len()
                    ))
                })?;
                SessionIssuer::from_seed(&seed)
            }
            None => {
                tracing::warn!("No signing seed configured, using an ephemeral session key");
                SessionIssuer::generate()
            }
        };

        if self.session_ttl_secs <= 0 {
            return Err(DaemonError::Config(
                "session_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(issuer.with_ttl(chrono::Duration::seconds(self.session_ttl_secs)))
    }

    pub fn admin_code(&self) -> Option<AdminCode> {
        self.admin_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .map(AdminCode::new)
    }
}

/// Access control configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Enforce role-to-subtree matching at the edge as well as on the client
    #[serde(default)]
    pub enforce_roles_at_edge: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_session_ttl() -> i64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `HEAL_`-prefixed environment (`HEAL_IDENTITY__ADMIN_CODE`, ...)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Field names contain underscores, so nesting uses a double one
        builder = builder.add_source(
            config::Environment::with_prefix("HEAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
