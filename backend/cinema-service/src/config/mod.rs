use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub search: SearchSettings,
    pub moderation: ModerationSettings,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Only verification settings live here; tokens are minted elsewhere.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_search_limit")]
    pub max_limit: i64,
    /// Per-kind cap used by the "search everything" fan-out.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: i64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_max_search_limit(),
            preview_limit: default_preview_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ModerationSettings {
    #[serde(default = "default_summary_limit")]
    pub summary_limit: i64,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            summary_limit: default_summary_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_search_limit() -> i64 {
    20
}

fn default_max_search_limit() -> i64 {
    100
}

fn default_preview_limit() -> i64 {
    5
}

fn default_summary_limit() -> i64 {
    100
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/cinema")?
            .set_default("database.max_connections", 10)?
            .set_default("jwt.secret", "development-secret-change-in-production")?
            .set_default("search.default_limit", 20)?
            .set_default("search.max_limit", 100)?
            .set_default("search.preview_limit", 5)?
            .set_default("moderation.summary_limit", 100)?
            .set_default("log.format", "pretty")?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
