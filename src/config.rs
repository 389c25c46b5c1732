use crate::error::Error;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
pub const PORT: &str = "PORT";
pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const JWT_SECRET: &str = "JWT_SECRET";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub port: u16,
    pub max_connections: u32,
    pub jwt_secret: String,
}

impl Config {
    /// Reads settings from the process environment, after `.env` has been loaded.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| Error::ConfigError(format!("environment variable {} not been set", key)));
        let port = match lookup(PORT) {
            Some(v) => v.parse().map_err(|_| Error::ConfigError(format!("{} must be a port number, got {}", PORT, v)))?,
            None => 8000,
        };
        let max_connections = match lookup(DB_MAX_CONNECTIONS) {
            Some(v) => v.parse().map_err(|_| Error::ConfigError(format!("{} must be a positive integer, got {}", DB_MAX_CONNECTIONS, v)))?,
            None => 5,
        };
        Ok(Self {
            database_url: required(DATABASE_URL)?,
            bind_address: lookup(BIND_ADDRESS).unwrap_or_else(|| "0.0.0.0".into()),
            port,
            max_connections,
            jwt_secret: required(JWT_SECRET)?,
        })
    }
}
