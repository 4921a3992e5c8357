//! Configuration – reads/writes `~/.privacy-bridge/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use privacy_bridge::BridgeConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Persisted settings stored in `~/.privacy-bridge/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket URL of the privacy capability relay host.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Capability wait settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

fn default_relay_url() -> String {
    "ws://127.0.0.1:9191".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            bridge: BridgeConfig::default(),
        }
    }
}

/// Return the path to `~/.privacy-bridge/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".privacy-bridge").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, ConfigError> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(toml::from_str(&raw)?))
}

/// Apply environment overrides: `PRIVACY_RELAY_URL` plus the bridge's own
/// `PRIVACY_POLL_INTERVAL_MS` / `PRIVACY_TIMEOUT_MS`.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PRIVACY_RELAY_URL") {
        cfg.relay_url = v;
    }
    cfg.bridge.apply_env_overrides();
}

/// Save the config to disk, creating `~/.privacy-bridge/` if necessary.
pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(io_err)?;
        }
    }
    let raw = toml::to_string_pretty(cfg)?;

    // Owner-only read/write on Unix.
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(io_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");

        assert_eq!(loaded.relay_url, "ws://127.0.0.1:9191");
        assert_eq!(loaded.bridge.poll_interval_ms, 50);
        assert_eq!(loaded.bridge.timeout_ms, 5000);
    }

    #[test]
    fn bridge_table_is_optional() {
        let cfg: Config = toml::from_str(r#"relay_url = "ws://10.0.0.2:7000""#).unwrap();
        assert_eq!(cfg.relay_url, "ws://10.0.0.2:7000");
        assert_eq!(cfg.bridge, BridgeConfig::default());
    }

    #[test]
    fn bridge_table_overrides_polling() {
        let raw = r#"
            [bridge]
            poll_interval_ms = 25
        "#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.relay_url, "ws://127.0.0.1:9191");
        assert_eq!(cfg.bridge.poll_interval_ms, 25);
        assert_eq!(cfg.bridge.timeout_ms, 5000);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "relay_url = [").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_privacy_bridge_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".privacy-bridge"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn relay_url_env_override() {
        // SAFETY: the only test in this crate touching this variable.
        unsafe { std::env::set_var("PRIVACY_RELAY_URL", "ws://relay.local:1234") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.relay_url, "ws://relay.local:1234");
        unsafe { std::env::remove_var("PRIVACY_RELAY_URL") };
    }
}
