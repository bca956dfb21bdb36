use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub session_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Items per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Marks the session cookie `Secure`; turn on behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    session_secret: Option<String>,
    listen_addr: Option<String>,
    page_size: Option<u64>,
    log_dir: Option<String>,
    secure_cookies: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_page_size() -> u64 {
    3
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl PartialServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let page_size = match lookup("PAGE_SIZE") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "PAGE_SIZE",
                value: raw.clone(),
            })?),
            None => None,
        };
        let secure_cookies = match lookup("SECURE_COOKIES") {
            Some(raw) => Some(parse_bool(&raw).ok_or(ConfigError::Invalid {
                key: "SECURE_COOKIES",
                value: raw.clone(),
            })?),
            None => None,
        };
        Ok(PartialServerConfig {
            database_url: lookup("DATABASE_URL"),
            session_secret: lookup("SESSION_SECRET"),
            listen_addr: lookup("LISTEN_ADDR"),
            page_size,
            log_dir: lookup("LOG_DIR"),
            secure_cookies,
        })
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    /// Loads the optional TOML file, then lets environment variables
    /// (including a `.env` file) override it.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => PartialServerConfig::from_file(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config = PartialServerConfig::from_env()?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn merge(
        env_config: PartialServerConfig,
        file_config: PartialServerConfig,
    ) -> Result<Self, ConfigError> {
        let session_secret = env_config
            .session_secret
            .or(file_config.session_secret)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?;

        Ok(ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            session_secret,
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            page_size: env_config
                .page_size
                .or(file_config.page_size)
                .filter(|size| *size > 0)
                .unwrap_or_else(default_page_size),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            secure_cookies: env_config
                .secure_cookies
                .or(file_config.secure_cookies)
                .unwrap_or(false),
        })
    }
}
