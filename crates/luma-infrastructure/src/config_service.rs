//! Configuration service implementation.
//!
//! Loads the root configuration from the configuration file
//! (`~/.config/luma/config.toml`), writing a default file when none exists.

use crate::paths::LumaPaths;
use luma_core::config::LumaConfig;
use luma_core::error::{LumaError, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the root configuration.
///
/// The configuration is read once and cached to avoid repeated file I/O;
/// a missing or unreadable file degrades to defaults rather than failing.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<LumaConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService at the default platform location.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be determined.
    pub fn new() -> Result<Self> {
        let path = LumaPaths::config_file().map_err(|e| LumaError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a ConfigService reading from an explicit path (used by tests).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> LumaConfig {
        {
            let read_lock = self.config.read().expect("config cache lock poisoned");
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_else(|e| {
            tracing::warn!("failed to load config, using defaults: {}", e);
            LumaConfig::default()
        });

        {
            let mut write_lock = self.config.write().expect("config cache lock poisoned");
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().expect("config cache lock poisoned");
        *write_lock = None;
    }

    /// Persists `config` and refreshes the cache.
    pub fn save(&self, config: &LumaConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, rendered)?;

        let mut write_lock = self.config.write().expect("config cache lock poisoned");
        *write_lock = Some(config.clone());
        Ok(())
    }

    fn load_config(&self) -> Result<LumaConfig> {
        if !self.path.exists() {
            // First run: write the default file so users can discover the knobs
            let default_config = LumaConfig::default();
            self.save(&default_config)?;
            return Ok(default_config);
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults_and_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let config = service.get_config();
        assert_eq!(config, LumaConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_existing_file_is_loaded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "initial_points_grant = 42\n").unwrap();

        let service = ConfigService::with_path(path);
        assert_eq!(service.get_config().initial_points_grant, 42);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let mut config = LumaConfig::default();
        config.admin_emails = vec!["ops@luma.chat".to_string()];
        service.save(&config).unwrap();

        let reloaded = ConfigService::with_path(path);
        assert_eq!(
            reloaded.get_config().admin_emails,
            vec!["ops@luma.chat".to_string()]
        );
    }
}
