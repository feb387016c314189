use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_FAVORITE_IDLE_SECS: u64 = 30 * 60;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database URL the server runs on in-process stores.
    pub database_url: Option<String>,
    pub port: u16,
    pub max_connections: u32,
    pub allowed_origins: Vec<String>,
    /// Enables HSTS.
    pub production: bool,
    /// How long an unused favorites mirror is kept before it is dropped.
    pub favorite_idle_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            production: false,
            favorite_idle_ttl: Duration::from_secs(DEFAULT_FAVORITE_IDLE_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            port: parse_or("PORT", env::var("PORT").ok(), DEFAULT_PORT),
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                env::var("DATABASE_MAX_CONNECTIONS").ok(),
                DEFAULT_MAX_CONNECTIONS,
            ),
            allowed_origins: split_origins(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            production: env::var("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            favorite_idle_ttl: Duration::from_secs(parse_or(
                "FAVORITE_SESSION_IDLE_SECS",
                env::var("FAVORITE_SESSION_IDLE_SECS").ok(),
                DEFAULT_FAVORITE_IDLE_SECS,
            )),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Config: invalid {} '{}', using {}", name, raw, default);
            default
        }),
    }
}
