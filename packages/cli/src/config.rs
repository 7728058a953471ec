//! Settings shared by every invocation, read from `<config dir>/docfs/config.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use docfs_json_store::FilesystemOptions;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Read {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Failed to parse config file {path}: {error}")]
    Parse {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
}

/// Contents of the config file.  Every field is optional; flags on the command line win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub root: Option<PathBuf>,
    #[serde(flatten)]
    pub options: FilesystemOptions,
}

impl Config {
    /// Load `path`, treating a missing file as an empty config.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(error) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    error,
                })
            }
        };

        tracing::debug!("Loaded config from {}", path.display());
        serde_json::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("docfs").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn fields_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"root": "/srv/docs", "create_dirs": true, "prune_empty_dirs": true}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.root, Some(PathBuf::from("/srv/docs")));
        assert_eq!(
            config.options,
            FilesystemOptions::default()
                .with_create_dirs()
                .with_prune_empty_dirs()
        );
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"create_dirs": true}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.root, None);
        assert!(config.options.create_dirs);
        assert!(!config.options.prune_empty_dirs);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
