/// Configuration management for yatube-service
///
/// All settings come from environment variables (a `.env` file is loaded by
/// `main` before this runs). Development defaults let the service start with
/// no configuration at all; production refuses insecure defaults.
use db_pool::env_utils::{env_string_or, parse_env_strict};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::INDEX_CACHE_TTL_SECS;
use crate::pagination::POSTS_PER_PAGE;

pub const DEV_JWT_SECRET: &str = "yatube-dev-secret-change-me";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL; the in-process cache is used when unset
    pub redis_url: Option<String>,
    pub index_ttl: Duration,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_ttl_secs", &self.jwt_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: String,
    /// Public URL prefix the reverse proxy serves `root` under
    pub url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub posts_per_page: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = env_string_or("APP_ENV", "development");
        let production = app_env.eq_ignore_ascii_case("production");

        let app = AppConfig {
            env: app_env,
            host: env_string_or("YATUBE_HOST", "0.0.0.0"),
            port: parse_env_strict("YATUBE_PORT", 8000)?,
            log_format: env_string_or("LOG_FORMAT", "text").parse()?,
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let database = DatabaseConfig {
            backend: env_string_or("STORAGE_BACKEND", "postgres").parse()?,
            url: env_string_or("DATABASE_URL", "postgresql://localhost/yatube"),
            max_connections: parse_env_strict("DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let cache = CacheConfig {
            redis_url: std::env::var("REDIS_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            index_ttl: Duration::from_secs(parse_env_strict(
                "INDEX_CACHE_TTL_SECS",
                INDEX_CACHE_TTL_SECS,
            )?),
        };

        let auth = {
            let jwt_secret = env_string_or("JWT_SECRET", DEV_JWT_SECRET);
            if production && jwt_secret == DEV_JWT_SECRET {
                return Err("JWT_SECRET must be set to a non-default value in production".to_string());
            }
            let jwt_ttl_secs: i64 = parse_env_strict("JWT_TTL_SECS", 24 * 3600)?;
            if jwt_ttl_secs <= 0 {
                return Err("JWT_TTL_SECS must be positive".to_string());
            }
            AuthConfig {
                jwt_secret,
                jwt_ttl_secs,
            }
        };

        let media = MediaConfig {
            root: env_string_or("MEDIA_ROOT", "media"),
            url: env_string_or("MEDIA_URL", "/media/"),
            max_upload_bytes: parse_env_strict("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
        };

        let site = SiteConfig {
            posts_per_page: parse_env_strict("POSTS_PER_PAGE", POSTS_PER_PAGE)?,
        };
        if site.posts_per_page == 0 {
            return Err("POSTS_PER_PAGE must be at least 1".to_string());
        }

        Ok(Config {
            app,
            cors,
            database,
            cache,
            auth,
            media,
            site,
        })
    }
}
