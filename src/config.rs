//! Configuration management with validation and defaults
//!
//! Loaded from TOML, every section optional, validated before the server
//! starts.

use crate::errors::{TambolaError, TambolaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level server configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TambolaConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
}

/// HTTP/WebSocket server settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Game-core tuning knobs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Defensive retry cap per ticket cell; never reached in practice.
    pub ticket_max_attempts_per_cell: u32,
    /// Per-room broadcast channel capacity. Must exceed the events a game
    /// can produce between a listener's polls (90 calls plus claims).
    pub room_channel_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ticket_max_attempts_per_cell: 1_000,
            room_channel_capacity: 256,
        }
    }
}

impl TambolaConfig {
    /// Load from a TOML file, falling back to defaults for missing keys.
    pub fn load(path: &Path) -> TambolaResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TambolaError::Configuration(format!("read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| TambolaError::Configuration(format!("parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TambolaResult<()> {
        if self.server.request_timeout_secs == 0 {
            return Err(TambolaError::Configuration(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.game.room_channel_capacity < 128 {
            return Err(TambolaError::Configuration(format!(
                "room_channel_capacity {} is below the safe minimum of 128",
                self.game.room_channel_capacity
            )));
        }
        if self.game.ticket_max_attempts_per_cell == 0 {
            return Err(TambolaError::Configuration(
                "ticket_max_attempts_per_cell must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        TambolaConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TambolaConfig = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            allowed_origins = ["https://play.example.com"]
            request_timeout_secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.game.room_channel_capacity, 256);
    }

    #[test]
    fn test_validation_rejects_tiny_channel() {
        let mut config = TambolaConfig::default();
        config.game.room_channel_capacity = 8;
        assert!(config.validate().is_err());
    }
}
