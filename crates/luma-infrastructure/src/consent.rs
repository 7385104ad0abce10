//! Local consent flag.
//!
//! A single persisted boolean read once at startup to decide whether to
//! prompt for consent. Outside the sync core's correctness domain.

use luma_core::error::{LumaError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-backed consent flag.
pub struct ConsentFlag {
    path: PathBuf,
}

impl ConsentFlag {
    /// Creates a flag at the default location (`~/.local/share/luma/consent`).
    pub fn default_location() -> Result<Self> {
        use crate::paths::LumaPaths;
        let path = LumaPaths::consent_file().map_err(|e| LumaError::config(e.to_string()))?;
        Ok(Self::at(path))
    }

    /// Creates a flag at an explicit path.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Whether consent has been granted. Absent or unreadable means "not yet".
    pub async fn is_granted(&self) -> bool {
        matches!(fs::read_to_string(&self.path).await, Ok(raw) if raw.trim() == "true")
    }

    /// Records that consent was granted.
    pub async fn grant(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, "true").await?;
        Ok(())
    }

    /// Withdraws consent.
    pub async fn revoke(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
