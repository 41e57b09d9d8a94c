use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    SharedSecret,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub db_name: String,

    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub jwt_access_ttl_seconds: i64,
    pub jwt_refresh_ttl_seconds: i64,

    pub store_timeout: Duration,

    pub bind_addr: String,
    pub cors_origin: Option<String>,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let store_backend = match get("STORE_BACKEND").as_deref() {
            None | Some("mongo") => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let mongodb_uri = get("MONGODB_URI");
        if store_backend == StoreBackend::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }
        let db_name = get("DB_NAME").unwrap_or_else(|| "videotube".to_string());

        let access_token_secret =
            get("ACCESS_TOKEN_SECRET").ok_or(ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        let refresh_token_secret =
            get("REFRESH_TOKEN_SECRET").ok_or(ConfigError::Missing("REFRESH_TOKEN_SECRET"))?;
        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }

        let jwt_access_ttl_seconds = parse_ttl(&get, "JWT_ACCESS_TTL_SECONDS", 15 * 60)?;
        let jwt_refresh_ttl_seconds =
            parse_ttl(&get, "JWT_REFRESH_TTL_SECONDS", 30 * 24 * 60 * 60)?;
        let store_timeout_ms: u64 = parse_or(&get, "STORE_TIMEOUT_MS", 5_000)?;

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8000".to_string());
        let cors_origin = get("CORS_ORIGIN");
        let cookie_secure = parse_or(&get, "COOKIE_SECURE", true)?;

        Ok(Self {
            store_backend,
            mongodb_uri,
            db_name,
            access_token_secret,
            refresh_token_secret,
            jwt_access_ttl_seconds,
            jwt_refresh_ttl_seconds,
            store_timeout: Duration::from_millis(store_timeout_ms),
            bind_addr,
            cors_origin,
            cookie_secure,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

// ten years
const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

fn parse_ttl<G>(get: &G, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let ttl = parse_or(get, name, default)?;
    if ttl <= 0 || ttl > MAX_TTL_SECONDS {
        return Err(ConfigError::Invalid {
            name,
            value: ttl.to_string(),
        });
    }
    Ok(ttl)
}
