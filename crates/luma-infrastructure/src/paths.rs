//! Unified path management for LUMA configuration and data files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for LUMA.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/luma/              # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/luma/         # Data directory
/// ├── profiles/                # One JSON row per identity
/// ├── messages/                # One JSON log per identity
/// └── consent                  # Local consent flag
/// ```
pub struct LumaPaths;

impl LumaPaths {
    /// Returns the LUMA configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/luma/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("luma"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the LUMA data directory, used for profile and message rows.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("luma"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the profiles directory.
    pub fn profiles_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("profiles"))
    }

    /// Returns the path to the messages directory.
    pub fn messages_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("messages"))
    }

    /// Returns the path to the local consent flag file.
    pub fn consent_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("consent"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let config_dir = LumaPaths::config_dir().unwrap();
        assert!(config_dir.ends_with("luma"));
    }

    #[test]
    fn test_config_file() {
        let config_file = LumaPaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        let config_dir = LumaPaths::config_dir().unwrap();
        assert!(config_file.starts_with(&config_dir));
    }

    #[test]
    fn test_data_subdirs() {
        let data_dir = LumaPaths::data_dir().unwrap();
        assert!(LumaPaths::profiles_dir().unwrap().starts_with(&data_dir));
        assert!(LumaPaths::messages_dir().unwrap().starts_with(&data_dir));
        assert!(LumaPaths::consent_file().unwrap().starts_with(&data_dir));
    }
}
