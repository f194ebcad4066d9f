use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::tenancy::DEV_SLUG;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub tenancy: TenancyConfig,
    pub provisioning: ProvisioningConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base connection string; tenant connection strings are derived from it
    pub url: Option<String>,
    /// Control-plane store; falls back to `url` when unset
    pub master_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    pub store_prefix: String,
    pub dev_slug: String,
    pub local_suffix: String,
    pub www_alias: String,
    /// Slugs that map to the default store instead of a per-tenant one
    pub default_aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub schema_sync_program: String,
    pub schema_sync_args: Vec<String>,
    pub schema_path: PathBuf,
    /// Env var through which the target connection string reaches the tool
    pub schema_sync_url_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl DatabaseConfig {
    /// Master store connection string, if any is configured
    pub fn master_url(&self) -> Option<&str> {
        self.master_url.as_deref().or(self.url.as_deref())
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Ok(v) = env::var("MASTER_DATABASE_URL") {
            self.database.master_url = non_empty(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Tenancy overrides
        if let Ok(v) = env::var("TENANT_STORE_PREFIX") {
            self.tenancy.store_prefix = v;
        }
        if let Ok(v) = env::var("TENANT_DEV_SLUG") {
            self.tenancy.dev_slug = v;
        }
        if let Ok(v) = env::var("TENANT_LOCAL_SUFFIX") {
            self.tenancy.local_suffix = v;
        }
        if let Ok(v) = env::var("TENANT_DEFAULT_ALIASES") {
            self.tenancy.default_aliases = split_list(&v);
        }

        // Provisioning overrides
        if let Ok(v) = env::var("SCHEMA_SYNC_PROGRAM") {
            self.provisioning.schema_sync_program = v;
        }
        if let Ok(v) = env::var("SCHEMA_SYNC_ARGS") {
            self.provisioning.schema_sync_args = v.split_whitespace().map(str::to_string).collect();
        }
        if let Ok(v) = env::var("SCHEMA_PATH") {
            self.provisioning.schema_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("SCHEMA_SYNC_URL_ENV") {
            self.provisioning.schema_sync_url_env = v;
        }
        if let Ok(v) = env::var("PROVISIONING_TIMEOUT_SECS") {
            self.provisioning.timeout_secs = v.parse().unwrap_or(self.provisioning.timeout_secs);
        }

        // API overrides
        if let Some(port) = env::var("OMNIA_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                master_url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            tenancy: TenancyConfig::default(),
            provisioning: ProvisioningConfig {
                timeout_secs: 600,
                ..ProvisioningConfig::default()
            },
            api: ApiConfig { port: 3000 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                master_url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            tenancy: TenancyConfig::default(),
            provisioning: ProvisioningConfig::default(),
            api: ApiConfig { port: 3000 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                master_url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            tenancy: TenancyConfig::default(),
            provisioning: ProvisioningConfig::default(),
            api: ApiConfig { port: 3000 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            store_prefix: "omnia_tenant_".to_string(),
            dev_slug: DEV_SLUG.to_string(),
            local_suffix: "localhost".to_string(),
            www_alias: "www".to_string(),
            default_aliases: vec![DEV_SLUG.to_string(), "localhost".to_string()],
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            schema_sync_program: "npx".to_string(),
            schema_sync_args: ["prisma", "db", "push", "--skip-generate", "--accept-data-loss"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            schema_path: PathBuf::from("prisma/schema.prisma"),
            schema_sync_url_env: "DATABASE_URL".to_string(),
            timeout_secs: 300,
        }
    }
}

fn non_empty(v: String) -> Option<String> {
    if v.trim().is_empty() {
        None
    } else {
        Some(v)
    }
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.tenancy.dev_slug, "dev");
        assert_eq!(config.provisioning.timeout_secs, 600);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert!(config.security.cors_origins.iter().all(|o| o.starts_with("https://")));
        assert_eq!(config.tenancy.store_prefix, "omnia_tenant_");
    }

    #[test]
    fn master_url_falls_back_to_base() {
        let mut database = AppConfig::development().database;
        database.url = Some("postgres://u:p@db:5432/omnia".to_string());
        assert_eq!(database.master_url(), Some("postgres://u:p@db:5432/omnia"));

        database.master_url = Some("postgres://u:p@control:5432/omnia_master".to_string());
        assert_eq!(database.master_url(), Some("postgres://u:p@control:5432/omnia_master"));
    }

    #[test]
    fn default_schema_sync_accepts_data_loss() {
        let provisioning = ProvisioningConfig::default();
        assert_eq!(provisioning.schema_sync_program, "npx");
        assert!(provisioning.schema_sync_args.iter().any(|a| a == "--accept-data-loss"));
        assert_eq!(provisioning.schema_sync_url_env, "DATABASE_URL");
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list("dev, localhost,,"), vec!["dev", "localhost"]);
    }
}
