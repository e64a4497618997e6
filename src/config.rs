use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Process-wide settings, read once at startup and passed by reference.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub charts: ChartsConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ChartsConfig {
    pub output_dir: PathBuf,
    /// Raster figure size in inches, width then height.
    pub figsize: [f64; 2],
    pub dpi: u32,
    pub background_color: String,
    pub font_family: String,
    /// Prefix of the path handed back to callers.
    pub web_prefix: String,
    pub open_after_render: bool,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        ChartsConfig {
            output_dir: PathBuf::from("static/charts"),
            figsize: [12.0, 7.0],
            dpi: 300,
            background_color: "#1a1a1a".to_string(),
            font_family: "sans-serif".to_string(),
            web_prefix: "/static/charts".to_string(),
            open_after_render: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Daily rolling log file; console only when absent.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: Some(PathBuf::from("logs/chartforge.log")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TableBackend {
    #[default]
    Sqlite,
    Csv,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: TableBackend,
    /// SQLite database file.
    pub path: PathBuf,
    /// Directory of `<table>.csv` files for the csv backend.
    pub data_dir: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: TableBackend::Sqlite,
            path: PathBuf::from("data/project_storage.db"),
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Base URL of the message service. Notifications are only logged when unset.
    pub endpoint: Option<String>,
    pub sender: String,
    pub timeout_secs: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        NotificationsConfig {
            endpoint: None,
            sender: "图表系统".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise. A present but broken
    /// file is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) if p.as_ref().exists() => Self::load(p),
            _ => Ok(AppConfig::default()),
        }
    }
}
