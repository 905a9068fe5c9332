//! Store configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::Result;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "OFFTHEPOST_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("offthepost.db"),
        }
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;

        if config.database_path.as_os_str().is_empty() {
            return Err(CoreError::Config(format!(
                "{}: database_path is empty",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), database = %config.database_path.display(), "Loaded config");
        Ok(config)
    }

    pub fn data_dir() -> PathBuf {
        resolve_data_dir(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn resolve_data_dir(env_override: Option<PathBuf>) -> PathBuf {
    env_override
        .filter(|dir| !dir.as_os_str().is_empty())
        .or_else(|| dirs::data_local_dir().map(|d| d.join("OffThePost")))
        .unwrap_or_else(|| PathBuf::from(".offthepost"))
}

// Platform data directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offthepost_storage::ErrorKind;

    #[test]
    fn test_new_places_database_in_data_dir() {
        let config = Config::new(PathBuf::from("/srv/league"));
        assert_eq!(config.database_path, PathBuf::from("/srv/league/offthepost.db"));
    }

    #[test]
    fn test_env_override_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/tmp/instance")));
        assert_eq!(dir, PathBuf::from("/tmp/instance"));

        // An empty override falls through to the platform directory
        let dir = resolve_data_dir(Some(PathBuf::new()));
        assert_ne!(dir, PathBuf::new());
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "database_path": "/data/otp.db" }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/data/otp.db"));
    }

    #[test]
    fn test_load_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = Config::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, CoreError::Io(_)));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            CoreError::Serialization(_)
        ));

        std::fs::write(&path, r#"{ "database_path": "" }"#).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
