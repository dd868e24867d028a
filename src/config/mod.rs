use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ACCESS_TOKEN_SECRET is not set")]
    MissingSecret,

    #[error("DATABASE_URL is required for the postgres store")]
    MissingDatabaseUrl,

    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub collections: CollectionNames,
}

/// Physical collection names for the three document kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionNames {
    pub services: String,
    pub products: String,
    pub bookings: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            services: "serviceCollection".to_string(),
            products: "productsCollection".to_string(),
            bookings: "bookingsCollection".to_string(),
        }
    }
}

impl CollectionNames {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [&self.services, &self.products, &self.bookings] {
            if !is_valid_collection_name(name) {
                return Err(ConfigError::InvalidCollectionName(name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Store overrides
        match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => self.store.backend = StoreBackend::Memory,
            Ok("postgres") => self.store.backend = StoreBackend::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.store.database_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.store.connection_timeout = v.parse().unwrap_or(self.store.connection_timeout);
        }
        if let Ok(v) = env::var("SERVICES_COLLECTION") {
            self.store.collections.services = v;
        }
        if let Ok(v) = env::var("PRODUCTS_COLLECTION") {
            self.store.collections.products = v;
        }
        if let Ok(v) = env::var("BOOKINGS_COLLECTION") {
            self.store.collections.bookings = v;
        }

        // Security overrides
        if let Ok(v) = env::var("ACCESS_TOKEN_SECRET") {
            self.security.token_secret = v;
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }

        self
    }

    /// Check the settings that would otherwise only fail on first use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.token_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.store.backend == StoreBackend::Postgres && self.store.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        self.store.collections.validate()
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 10,
                connection_timeout: 30,
                collections: CollectionNames::default(),
            },
            security: SecurityConfig {
                token_secret: String::new(),
                token_ttl_secs: 60 * 60,
                cors_origins: vec!["http://localhost:5173".to_string()],
                cookie_secure: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 20,
                connection_timeout: 10,
                collections: CollectionNames::default(),
            },
            security: SecurityConfig {
                token_secret: String::new(),
                token_ttl_secs: 60 * 60,
                cors_origins: vec!["https://staging.car-doctor.example.com".to_string()],
                cookie_secure: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 50,
                connection_timeout: 5,
                collections: CollectionNames::default(),
            },
            security: SecurityConfig {
                token_secret: String::new(),
                token_ttl_secs: 60 * 60,
                cors_origins: vec!["https://car-doctor.example.com".to_string()],
                cookie_secure: false,
            },
        }
    }
}

/// Collection names end up as SQL table identifiers, so keep them plain
pub fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Global singleton config - read once by the binary at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.security.token_ttl_secs, 3600);
        assert!(!config.security.cookie_secure);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.collections, CollectionNames::default());
    }

    #[test]
    fn default_collection_names_match_deployed_collections() {
        let names = CollectionNames::default();
        assert_eq!(names.services, "serviceCollection");
        assert_eq!(names.products, "productsCollection");
        assert_eq!(names.bookings, "bookingsCollection");
        assert_eq!(names.validate(), Ok(()));
    }

    #[test]
    fn rejects_missing_secret() {
        let config = AppConfig::development();
        assert_eq!(config.validate(), Err(ConfigError::MissingSecret));
    }

    #[test]
    fn postgres_requires_database_url() {
        let mut config = AppConfig::production();
        config.security.token_secret = "secret".to_string();
        assert_eq!(config.validate(), Err(ConfigError::MissingDatabaseUrl));

        config.store.database_url = Some("postgres://localhost/car_doctor".to_string());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validates_collection_names() {
        assert!(is_valid_collection_name("services"));
        assert!(is_valid_collection_name("bookingsCollection"));
        assert!(is_valid_collection_name("_private_1"));
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("1services"));
        assert!(!is_valid_collection_name("services; DROP TABLE bookings"));
        assert!(!is_valid_collection_name("book-ings"));
    }
}
