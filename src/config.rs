use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/perdcomp";
const DEFAULT_CONFIG_FILE: &str = "perdcomp";
const ENV_PREFIX: &str = "PERDCOMP";

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// 超过该耗时的语句以 WARN 级别记录
    pub slow_statement_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: 5,
            acquire_timeout_secs: 10,
            slow_statement_secs: 5,
        }
    }
}

/// 从目录中挑选 PER 和 DCOMP 文件的文件名标记
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub per_markers: Vec<String>,
    pub dcomp_markers: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            per_markers: vec!["PER".to_string(), "DECLARAÇÃO".to_string()],
            dcomp_markers: vec!["DCOMP".to_string(), "DECLARAÇÃO".to_string()],
        }
    }
}

impl AppConfig {
    /// 依次叠加内置默认值、配置文件和 `PERDCOMP__*` 环境变量
    ///
    /// 未指定 `path` 时，读取工作目录中存在的 `perdcomp.{toml,yaml,json}`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}
