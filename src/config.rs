use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub memorial: MemorialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// Public-facing site settings used to build share links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            name: "Khatma".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorialConfig {
    pub enabled: bool,
    pub check_interval_secs: u64,
    /// Days from today until a generated memorial khatma is due.
    pub target_days: i64,
}

impl Default for MemorialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: 3600,
            target_days: 7,
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // no config file: DATABASE_URL is mandatory, the rest falls back to defaults
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;
                Self::from_env(database_url)
            }
            Err(e) => {
                return Err(format!("cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_env(database_url: String) -> Self {
        let memorial = MemorialConfig::default();
        let site = SiteConfig::default();
        Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                refresh_token_expires_in: get_env_parse("JWT_REFRESH_EXPIRES_IN", 2_592_000i64),
            },
            site: SiteConfig {
                base_url: get_env("SITE_BASE_URL").unwrap_or(site.base_url),
                name: get_env("SITE_NAME").unwrap_or(site.name),
            },
            memorial: MemorialConfig {
                enabled: get_env_parse("MEMORIAL_ENABLED", memorial.enabled),
                check_interval_secs: get_env_parse(
                    "MEMORIAL_CHECK_INTERVAL_SECS",
                    memorial.check_interval_secs,
                ),
                target_days: get_env_parse("MEMORIAL_TARGET_DAYS", memorial.target_days),
            },
        }
    }

    /// Environment variables win over the file, even when it exists.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }

        if let Ok(v) = env::var("SITE_BASE_URL") {
            self.site.base_url = v;
        }
        if let Ok(v) = env::var("SITE_NAME") {
            self.site.name = v;
        }

        if let Ok(v) = env::var("MEMORIAL_ENABLED")
            && let Ok(b) = v.parse()
        {
            self.memorial.enabled = b;
        }
        if let Ok(v) = env::var("MEMORIAL_CHECK_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.memorial.check_interval_secs = n;
        }
        if let Ok(v) = env::var("MEMORIAL_TARGET_DAYS")
            && let Ok(n) = v.parse()
        {
            self.memorial.target_days = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_uses_section_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "s"
            access_token_expires_in = 60
            refresh_token_expires_in = 120
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.site.base_url, "http://localhost:8080");
        assert!(config.memorial.enabled);
        assert_eq!(config.memorial.target_days, 7);
    }

    #[test]
    fn test_parse_full_toml() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/khatma"
            max_connections = 5

            [jwt]
            secret = "s"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [site]
            base_url = "https://khatma.example"
            name = "Khatma"

            [memorial]
            enabled = false
            check_interval_secs = 60
            target_days = 3
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.site.base_url, "https://khatma.example");
        assert!(!config.memorial.enabled);
        assert_eq!(config.memorial.check_interval_secs, 60);
        assert_eq!(config.memorial.target_days, 3);
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(include_str!("../config.example.toml")).unwrap();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.memorial.check_interval_secs, 3600);
    }
}
