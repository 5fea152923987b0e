//! Process settings read from the environment (after `.env` is loaded).

use crate::error::ConfigError;
use std::net::SocketAddr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/backoffice";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_SCHEMA: &str = "backoffice";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub bind: SocketAddr,
    /// Schema holding the migration ledger.
    pub schema: String,
    pub max_connections: u32,
}

impl Settings {
    /// `DATABASE_URL`, `BACKOFFICE_BIND`, `BACKOFFICE_SCHEMA`, `DB_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_raw = get("BACKOFFICE_BIND", DEFAULT_BIND);
        let bind = bind_raw
            .parse()
            .map_err(|_| ConfigError::Validation(format!("BACKOFFICE_BIND is not a socket address: {}", bind_raw)))?;

        let schema = get("BACKOFFICE_SCHEMA", DEFAULT_SCHEMA);
        if !schema.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Validation(format!(
                "BACKOFFICE_SCHEMA must be a plain identifier: {}",
                schema
            )));
        }

        let max_raw = get("DB_MAX_CONNECTIONS", &DEFAULT_MAX_CONNECTIONS.to_string());
        let max_connections = max_raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::Validation(format!("DB_MAX_CONNECTIONS must be a positive integer: {}", max_raw)))?;

        Ok(Self {
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            bind,
            schema,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.bind.port(), 3000);
        assert_eq!(s.schema, "backoffice");
        assert_eq!(s.max_connections, 5);
    }

    #[test]
    fn overrides_and_rejections() {
        let s = settings(&[("DB_MAX_CONNECTIONS", "12"), ("BACKOFFICE_BIND", "127.0.0.1:8080")]).unwrap();
        assert_eq!(s.max_connections, 12);
        assert_eq!(s.bind.to_string(), "127.0.0.1:8080");
        assert!(settings(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(settings(&[("BACKOFFICE_BIND", "nowhere")]).is_err());
        assert!(settings(&[("BACKOFFICE_SCHEMA", "a;drop")]).is_err());
    }
}
