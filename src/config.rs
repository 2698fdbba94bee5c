//! Runtime configuration for the `puzlog` binary.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DATA_DIR_ENV: &str = "PUZLOG_DATA_DIR";
pub const USER_ID_ENV: &str = "PUZLOG_USER_ID";
pub const STORE_FILE: &str = "puzzles.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the puzzle store file.
    pub data_dir: PathBuf,
    /// Owner stamped on new records; stands in for the signed-in user.
    pub user_id: String,
    pub tick_interval_ms: u64,
    pub message_timeout_ms: u64,
    /// Page opened by `OpenPuzlogTab`.
    pub app_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("puzlog"))
            .unwrap_or_else(|| PathBuf::from(".puzlog"));
        Self {
            data_dir,
            user_id: "local".to_string(),
            tick_interval_ms: 1000,
            message_timeout_ms: 2000,
            app_url: "chrome-extension://puzlog/index.html".to_string(),
        }
    }
}

impl Config {
    /// `PUZLOG_DATA_DIR` and `PUZLOG_USER_ID` win over the file.
    pub fn apply_env_overrides(&mut self) -> Vec<&'static str> {
        let mut applied = Vec::new();
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
            applied.push(DATA_DIR_ENV);
        }
        if let Ok(user) = env::var(USER_ID_ENV) {
            if !user.trim().is_empty() {
                self.user_id = user.trim().to_string();
                applied.push(USER_ID_ENV);
            }
        }
        applied
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }

    /// Problems that would make the runtime misbehave; empty when usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.user_id.trim().is_empty() {
            problems.push("user_id must not be empty".to_string());
        }
        if self.tick_interval_ms == 0 {
            problems.push("tick_interval_ms must be greater than zero".to_string());
        }
        if self.message_timeout_ms == 0 {
            problems.push("message_timeout_ms must be greater than zero".to_string());
        }
        if self.data_dir.as_os_str().is_empty() {
            problems.push("data_dir must not be empty".to_string());
        }
        if self.app_url.trim().is_empty() {
            problems.push("app_url must not be empty".to_string());
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("user_id: alice\ntick_interval_ms: 500\n").unwrap();
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.message_timeout_ms, 2000);
        assert!(config.problems().is_empty());
    }

    #[test]
    fn zero_intervals_are_reported() {
        let config = Config {
            tick_interval_ms: 0,
            message_timeout_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.problems().len(), 2);
    }
}
