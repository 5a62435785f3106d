// Node configuration, loaded from a TOML file with environment overrides.
// Everything that consumes it gets it handed in; nothing reads configuration
// from globals.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_DATA_DIR: &str = "RELAY_LEDGER_DATA_DIR";
const ENV_THRESHOLD: &str = "RELAY_LEDGER_THRESHOLD";
const ENV_TICK_MS: &str = "RELAY_LEDGER_TICK_MS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory for all node state.
    pub data_dir: PathBuf,
    /// Peers that must echo an announcement before it counts as agreement.
    pub agreement_threshold: usize,
    /// Live-ledger size at which content rolls over into the shard archive.
    pub rollover_bytes: u64,
    /// Pipeline tick interval.
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            data_dir: PathBuf::from("data"),
            agreement_threshold: 2,
            rollover_bytes: 100_000_000,
            tick_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML file if given, then
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    LedgerError::Config(format!("Failed to read {}: {e}", path.display()))
                })?;
                toml::from_str(&raw)
                    .map_err(|e| LedgerError::Config(format!("Invalid config file: {e}")))?
            }
            None => Config::default(),
        };

        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(threshold) = std::env::var(ENV_THRESHOLD) {
            config.agreement_threshold = threshold
                .parse()
                .map_err(|_| LedgerError::Config(format!("{ENV_THRESHOLD} is not a number")))?;
        }
        if let Ok(tick) = std::env::var(ENV_TICK_MS) {
            config.tick_interval_ms = tick
                .parse()
                .map_err(|_| LedgerError::Config(format!("{ENV_TICK_MS} is not a number")))?;
        }

        if config.agreement_threshold == 0 {
            return Err(LedgerError::Config(
                "agreement_threshold must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn accounts_dir(&self) -> PathBuf {
        self.data_dir.join("accounts")
    }

    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backup")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }

    /// Raw relay lines (block events and transaction messages).
    pub fn chat_log(&self) -> PathBuf {
        self.data_dir.join("inbox").join("chat.log")
    }

    /// Miner name accompanying the latest mined-block event.
    pub fn miner_log(&self) -> PathBuf {
        self.data_dir.join("inbox").join("miner.log")
    }

    /// Block hash accompanying the latest mined-block event.
    pub fn block_hash_log(&self) -> PathBuf {
        self.data_dir.join("inbox").join("block_hash.log")
    }

    /// Peer announcement lines.
    pub fn votes_log(&self) -> PathBuf {
        self.data_dir.join("inbox").join("votes.log")
    }

    /// Outbound announcement for the relay to publish.
    pub fn outbound_log(&self) -> PathBuf {
        self.data_dir.join("outbox").join("announcement.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.agreement_threshold, 2);
        assert_eq!(config.rollover_bytes, 100_000_000);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = \"/tmp/node\"").unwrap();
        writeln!(file, "agreement_threshold = 3").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/node"));
        assert_eq!(config.agreement_threshold, 3);
        // Unset keys keep their defaults
        assert_eq!(config.tick_interval_ms, 500);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "agreement_threshold = \"lots\"").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_derived_paths() {
        let config = Config {
            data_dir: PathBuf::from("/srv/node"),
            ..Config::default()
        };
        assert_eq!(config.ledger_dir(), PathBuf::from("/srv/node/ledger"));
        assert_eq!(
            config.chat_log(),
            PathBuf::from("/srv/node/inbox/chat.log")
        );
    }
}
