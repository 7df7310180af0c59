use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{Clock, SheetCache, SystemClock};
use crate::error::DashboardError;
use crate::services::Dashboard;
use crate::source::{self, SheetSource};
use crate::types::Config;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "INSIGHTBOARD_CONFIG";

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub cache: Arc<SheetCache>,
}

impl AppState {
    /// Build the configured source and an empty cache in front of it.
    pub fn from_config(config: Config) -> Result<Self, DashboardError> {
        let source = source::from_config(&config)?;
        log::info!("Data source: {}", source.describe());
        Ok(Self::with_source(config, source, Arc::new(SystemClock)))
    }

    pub fn with_source(
        config: Config,
        source: Arc<dyn SheetSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = SheetCache::new(source, clock, config.cache_ttl(), config.refresh_policy);
        Self {
            config,
            cache: Arc::new(cache),
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(Arc::clone(&self.cache))
    }
}

/// Default config location: ~/.insightboard/config.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".insightboard").join("config.json"))
}

/// Load configuration.
///
/// Location: `explicit` (the `--config` flag), else `$INSIGHTBOARD_CONFIG`,
/// else ~/.insightboard/config.json. A missing default file means defaults;
/// a missing explicit file is an error. Environment overrides are applied
/// on top, then the result is validated.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, DashboardError> {
    load_config_with(explicit, |key| std::env::var(key).ok())
}

pub fn load_config_with(
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, DashboardError> {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| lookup(CONFIG_ENV).filter(|v| !v.trim().is_empty()).map(PathBuf::from));

    let mut config = match chosen {
        Some(path) => read_config_file(&path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => {
                log::debug!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    config.apply_env_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, DashboardError> {
    let content = fs::read_to_string(path).map_err(|e| {
        DashboardError::Configuration(format!(
            "Failed to read config {}: {}",
            path.display(),
            e
        ))
    })?;
    let config = serde_json::from_str(&content).map_err(|e| {
        DashboardError::Configuration(format!(
            "Failed to parse config {}: {}",
            path.display(),
            e
        ))
    })?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}
