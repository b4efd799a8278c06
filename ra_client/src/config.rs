use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Settings for the client, usually read from a JSON file.
///
/// Every field is optional in the file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the game server, as `host:port`.
    pub server: String,
    /// Minimum time between two displayed updates of the same burst.
    pub pacing_interval_ms: u64,
    /// Directory for the persisted session.
    pub session_dir: PathBuf,
    pub reconnect: ReconnectConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: String::from("127.0.0.1:5000"),
            pacing_interval_ms: 1_500,
            session_dir: PathBuf::from(".ra-client"),
            reconnect: ReconnectConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Attempts before the connection is declared lost.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 250,
            max_delay_ms: 5_000,
            max_attempts: 10,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"pacing_interval_ms\": 10, \"reconnect\": {{\"max_attempts\": 2}}}}").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.pacing_interval(), Duration::from_millis(10));
        assert_eq!(config.reconnect.max_attempts, 2);
        assert_eq!(config.reconnect.base_delay_ms, 250);
        assert_eq!(config.server, ClientConfig::default().server);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
