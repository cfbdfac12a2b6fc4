// Durable panel preferences
//
// The auto-settle toggle outlives any scheduler run, so it lives on disk
// rather than in scheduler state. A missing or unreadable file falls back to
// the defaults (auto-settle on).

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppResult;

pub trait PreferenceStore: Send + Sync {
    fn auto_settle_enabled(&self) -> bool;

    fn set_auto_settle_enabled(&self, enabled: bool) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default = "default_auto_settle")]
    pub auto_settle_enabled: bool,
}

fn default_auto_settle() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_settle_enabled: default_auto_settle(),
        }
    }
}

/// JSON-file backed preference store with an in-memory copy for reads
pub struct FilePreferenceStore {
    path: PathBuf,
    current: RwLock<Preferences>,
}

impl FilePreferenceStore {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let current = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Preferences>(&bytes) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!("⚠️  Ignoring unreadable preferences at {}: {}", path.display(), e);
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => {
                warn!("⚠️  Failed to read preferences at {}: {}", path.display(), e);
                Preferences::default()
            }
        };

        info!(
            "✅ Preferences loaded from {} (auto-settle: {})",
            path.display(),
            current.auto_settle_enabled
        );

        Self {
            path,
            current: RwLock::new(current),
        }
    }

    fn persist(&self, prefs: &Preferences) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(prefs)?)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn auto_settle_enabled(&self) -> bool {
        self.current.read().auto_settle_enabled
    }

    fn set_auto_settle_enabled(&self, enabled: bool) -> AppResult<()> {
        let mut current = self.current.write();
        let updated = Preferences {
            auto_settle_enabled: enabled,
        };
        self.persist(&updated)?;
        *current = updated;

        info!("💾 Auto-settle {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("settle-panel-prefs-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_defaults_to_enabled() {
        let store = FilePreferenceStore::load(temp_path());
        assert!(store.auto_settle_enabled());
    }

    #[test]
    fn test_preference_survives_reload() {
        let path = temp_path();

        let store = FilePreferenceStore::load(&path);
        store.set_auto_settle_enabled(false).unwrap();
        assert!(!store.auto_settle_enabled());

        let reloaded = FilePreferenceStore::load(&path);
        assert!(!reloaded.auto_settle_enabled());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let path = temp_path();
        std::fs::write(&path, b"{not json").unwrap();

        let store = FilePreferenceStore::load(&path);
        assert!(store.auto_settle_enabled());

        let _ = std::fs::remove_file(path);
    }
}
