use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set in environment variables")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub storage_backend: StorageBackend,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub bcrypt_cost: u32,
    pub redis_url: Option<String>,
    pub cors_origin: String,
    pub avatar_api_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "forum_db".to_string(),
            storage_backend: StorageBackend::Mongo,
            jwt_secret: String::new(),
            jwt_expire_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            redis_url: None,
            cors_origin: "http://localhost:3000".to_string(),
            avatar_api_url: "https://api.multiavatar.com".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(AppConfig {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            mongodb_uri: env::var("MONGODB_URI").unwrap_or(defaults.mongodb_uri),
            database_name: env::var("DATABASE_NAME").unwrap_or(defaults.database_name),
            storage_backend: parse_var("STORAGE_BACKEND", defaults.storage_backend)?,
            jwt_secret,
            jwt_expire_hours: parse_var("JWT_EXPIRE_HOURS", defaults.jwt_expire_hours)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            avatar_api_url: env::var("AVATAR_API_URL").unwrap_or(defaults.avatar_api_url),
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_known_names() {
        assert_eq!("mongo".parse::<StorageBackend>().unwrap(), StorageBackend::Mongo);
        assert_eq!("MEMORY".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn parse_var_falls_back_to_default() {
        let port: u16 = parse_var("FORUM_TEST_UNSET_PORT", 5000).unwrap();
        assert_eq!(port, 5000);
    }
}
