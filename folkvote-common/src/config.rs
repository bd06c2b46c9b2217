//! Configuration loading and database path resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "FOLKVOTE_DATABASE";

/// Resolve the database path with the following priority order:
/// 1. Command-line argument (highest priority)
/// 2. `FOLKVOTE_DATABASE` environment variable
/// 3. `database` key in the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Some(path) = database_from_toml(&config_path) {
            return Ok(path);
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_database_path())
}

/// Read the `database` key from a TOML config file, if present
pub fn database_from_toml(config_path: &Path) -> Option<PathBuf> {
    let toml_content = std::fs::read_to_string(config_path).ok()?;
    let config = toml::from_str::<toml::Value>(&toml_content).ok()?;
    config
        .get("database")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

/// Locate the configuration file for the platform
///
/// Linux checks `~/.config/folkvote/config.toml` then
/// `/etc/folkvote/config.toml`; macOS and Windows use the platform
/// config directory.
fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("folkvote").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/folkvote/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("folkvote"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/folkvote"))
        .join("folkvote.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_takes_priority() {
        let path = resolve_database_path(Some(Path::new("/tmp/explicit.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/explicit.db"));
    }

    #[test]
    fn test_database_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "database = \"/srv/folkvote/votes.db\"\n").unwrap();

        let path = database_from_toml(&config_path).unwrap();
        assert_eq!(path, PathBuf::from("/srv/folkvote/votes.db"));
    }

    #[test]
    fn test_database_from_toml_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "port = 5750\n").unwrap();

        assert!(database_from_toml(&config_path).is_none());
    }

    #[test]
    fn test_database_from_toml_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "not valid toml [[[").unwrap();

        assert!(database_from_toml(&config_path).is_none());
    }

    #[test]
    fn test_default_database_path_has_filename() {
        let path = default_database_path();
        assert_eq!(path.file_name().unwrap(), "folkvote.db");
    }
}
