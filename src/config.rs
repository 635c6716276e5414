/*
 * Responsibility
 * - Load settings from the environment (.env supported)
 * - Validate them up front: a bad signing secret or store setting fails startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;

use crate::services::auth::codec::SigningKey;

/// Shortest HMAC secret accepted for HS256.
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest accepted token validity: one year.
pub const MAX_VALIDITY_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStoreConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

/// Admin account ensured at startup (created if absent, then granted ROLE_ADMIN).
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub signing_key: SigningKey,
    pub token_validity: TimeDelta,

    pub user_store: UserStoreConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,

    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&get, "PORT", 8080)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }
        let signing_key = SigningKey::new(secret.into_bytes());

        let validity_minutes: i64 = parse_or(&get, "JWT_EXPIRATION_MINUTES", 30)?;
        let token_validity = (1..=MAX_VALIDITY_MINUTES)
            .contains(&validity_minutes)
            .then(|| TimeDelta::try_minutes(validity_minutes))
            .flatten()
            .ok_or(ConfigError::Invalid("JWT_EXPIRATION_MINUTES"))?;

        let user_store = match get("USER_STORE")
            .unwrap_or_else(|| "postgres".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => UserStoreConfig::Postgres {
                database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            },
            "memory" => UserStoreConfig::Memory,
            _ => return Err(ConfigError::Invalid("USER_STORE")),
        };

        let bootstrap_admin = match (
            get("BOOTSTRAP_ADMIN_USERNAME"),
            get("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                email: get("BOOTSTRAP_ADMIN_EMAIL")
                    .unwrap_or_else(|| format!("{username}@localhost")),
                username,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
        };

        let request_timeout = Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECONDS", 30)?);
        let max_body_bytes = parse_or(&get, "MAX_BODY_BYTES", 1024 * 1024)?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            signing_key,
            token_validity,
            user_store,
            bootstrap_admin,
            request_timeout,
            max_body_bytes,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
