use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::SweatError;

#[derive(Debug, Deserialize, Clone)]
pub struct SweatConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Settings for generated episode reports.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    /// Application name used in the title and footer lines.
    pub app_name: String,
    /// Leading part of every generated filename.
    pub file_prefix: String,
    /// Directory the download sink writes into.
    pub output_dir: String,
    /// Offset from UTC used when printing dates and naming files.
    pub utc_offset_minutes: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            app_name: "SweatSmart".to_string(),
            file_prefix: "sweatsmart".to_string(),
            output_dir: "reports".to_string(),
            utc_offset_minutes: 0,
        }
    }
}

impl SweatConfig {
    /// Load from a TOML file, then apply `SWEATSMART`-prefixed environment overrides.
    pub fn load(path: &str) -> Result<Self, SweatError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("SWEATSMART").separator("__"))
            .build()?;
        Ok(s.try_deserialize()?)
    }
}
