use std::time::Duration;

use mercuria_storage::S3Config;

use crate::auth::jwt::JwtConfig;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Token-store connection settings.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Namespace for session-record keys.
    pub key_prefix: String,
}

/// Identity-provider settings.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    /// Expected `aud` of Google ID tokens. Unset skips the audience check.
    pub google_client_id: Option<String>,
    /// Apple sign-in is disabled unless this is set.
    pub apple_client_id: Option<String>,
    pub key_cache_ttl_secs: u64,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Bound on each call to the database, token store, object storage or
    /// identity provider, in milliseconds (default: `5000`).
    pub external_call_timeout_ms: u64,
    /// Largest accepted photo-upload body in bytes (default: 20 MiB).
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub s3: S3Config,
    pub providers: ProvidersConfig,
    /// JWT token configuration (secrets, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `8000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `EXTERNAL_CALL_TIMEOUT_MS`  | `5000`                     |
    /// | `MAX_UPLOAD_BYTES`          | `20971520`                 |
    /// | `LOG_FORMAT`                | `pretty`                   |
    /// | `DATABASE_URL`              | composed from `DB_*`       |
    /// | `DB_MAX_CONNECTIONS`        | `10`                       |
    /// | `REDIS_URL`                 | composed from `REDIS_*`    |
    /// | `SESSION_KEY_PREFIX`        | `session`                  |
    /// | `GOOGLE_CLIENT_ID`          | unset                      |
    /// | `APPLE_CLIENT_ID`           | unset (Apple disabled)     |
    /// | `PROVIDER_KEY_CACHE_SECS`   | `3600`                     |
    /// | `S3_*`                      | see [`s3_config_from_env`] |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparseable values or missing JWT secrets, so
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");
        let port: u16 = env_parse("PORT", 8000);

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);
        let external_call_timeout_ms: u64 = env_parse("EXTERNAL_CALL_TIMEOUT_MS", 5000);
        let max_upload_bytes: usize =
            env_parse("MAX_UPLOAD_BYTES", mercuria_core::storage::DEFAULT_MAX_UPLOAD_BYTES);
        let log_format: LogFormat = env_parse("LOG_FORMAT", LogFormat::Pretty);

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| database_url_from_env()),
            max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| {
                let password = std::env::var("REDIS_PASSWORD").ok();
                mercuria_cache::redis_url_from_parts(
                    &env_or("REDIS_HOST", "localhost:6379"),
                    password.as_deref(),
                    env_parse("REDIS_DB", 0),
                )
            }),
            key_prefix: env_or("SESSION_KEY_PREFIX", mercuria_cache::redis_store::DEFAULT_KEY_PREFIX),
        };

        let providers = ProvidersConfig {
            google_client_id: non_empty_env("GOOGLE_CLIENT_ID"),
            apple_client_id: non_empty_env("APPLE_CLIENT_ID"),
            key_cache_ttl_secs: env_parse("PROVIDER_KEY_CACHE_SECS", 3600),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            external_call_timeout_ms,
            max_upload_bytes,
            log_format,
            database,
            redis,
            s3: s3_config_from_env(),
            providers,
            jwt: JwtConfig::from_env(),
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.external_call_timeout_ms)
    }
}

/// Object-storage settings.
///
/// | Env Var                | Default           |
/// |------------------------|-------------------|
/// | `S3_BUCKET`            | `mercuria-photos` |
/// | `S3_REGION`            | `us-east-1`       |
/// | `S3_ACCESS_KEY_ID`     | unset             |
/// | `S3_SECRET_ACCESS_KEY` | unset             |
/// | `S3_SESSION`           | unset             |
/// | `S3_ENDPOINT`          | unset             |
/// | `S3_PUBLIC_BASE_URL`   | derived           |
///
/// Without an access key the default AWS credential chain is used.
pub fn s3_config_from_env() -> S3Config {
    S3Config {
        bucket: env_or("S3_BUCKET", "mercuria-photos"),
        region: env_or("S3_REGION", "us-east-1"),
        access_key_id: non_empty_env("S3_ACCESS_KEY_ID"),
        secret_access_key: non_empty_env("S3_SECRET_ACCESS_KEY"),
        session_token: non_empty_env("S3_SESSION"),
        endpoint: non_empty_env("S3_ENDPOINT"),
        public_base_url: non_empty_env("S3_PUBLIC_BASE_URL"),
    }
}

/// Components of a PostgreSQL URL when `DATABASE_URL` is not given.
#[derive(Debug, Clone)]
pub struct DatabaseParts {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub schema: String,
}

impl DatabaseParts {
    /// Render as a URL that selects `schema` via `search_path`.
    pub fn to_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?options=-c%20search_path%3D{}",
            self.username, self.password, self.host, self.port, self.database, self.schema
        )
    }
}

fn database_url_from_env() -> String {
    DatabaseParts {
        username: env_or("DB_USERNAME", "postgres"),
        password: env_or("DB_PASSWORD", ""),
        host: env_or("DB_HOST", "localhost"),
        port: env_parse("DB_PORT", 5432),
        database: env_or("DB_DATABASE", "mercuria"),
        schema: env_or("DB_SCHEMA", "public"),
    }
    .to_url()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
