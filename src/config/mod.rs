use anyhow::{bail, Context};
use dotenvy::dotenv;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "coursehub.toml";
pub const ENV_PREFIX: &str = "COURSEHUB_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// How many times a course write is retried with a regenerated slug
    /// after losing a uniqueness race.
    pub slug_retry_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://coursehub:@localhost:5432/coursehub".to_string(),
                max_connections: 10,
            },
            catalog: CatalogConfig {
                slug_retry_attempts: 3,
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file (if present), then `COURSEHUB_*` env
    /// vars (`COURSEHUB_SERVER__PORT=9000`), then a plain `DATABASE_URL`.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        if let Ok(url) = std::env::var("DATABASE_URL") {
            figment = figment.merge(Serialized::default("database.url", url));
        }
        figment
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_figment(Self::figment(path))
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: AppConfig = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.catalog.slug_retry_attempts == 0 {
            bail!("catalog.slug_retry_attempts must be at least 1");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::from_figment(defaults()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = defaults().merge(Toml::string(
            r#"
            [server]
            port = 9000

            [catalog]
            slug_retry_attempts = 5
            "#,
        ));
        let config = AppConfig::from_figment(figment).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.catalog.slug_retry_attempts, 5);
    }

    #[test]
    fn test_config_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nurl = \"postgres://u:p@db/courses\"\nmax_connections = 4").unwrap();
        let figment = defaults().merge(Toml::file(file.path()));
        let config = AppConfig::from_figment(figment).unwrap();
        assert_eq!(config.database.url, "postgres://u:p@db/courses");
        assert_eq!(config.database.max_connections, 4);
    }

    #[test]
    fn test_zero_retry_attempts_rejected() {
        let figment = defaults().merge(Toml::string("[catalog]\nslug_retry_attempts = 0"));
        assert!(AppConfig::from_figment(figment).is_err());
    }
}
