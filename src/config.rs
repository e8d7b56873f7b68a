// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving controller settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::bluetooth::protocol::{DEFAULT_RFCOMM_CHANNEL, READ_BUFFER_SIZE, SPP_UUID};
use crate::bluetooth::LinkError;

/// Name the HC-06 receiver advertises out of the box.
const DEFAULT_TARGET_NAME: &str = "HC-06";

/// Address of the receiver fitted to the quadcopter.
const DEFAULT_TARGET_ADDRESS: &str = "00:14:03:06:02:47";

/// Controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bluetooth link settings.
    #[serde(default)]
    pub link: LinkConfig,

    /// Keep-alive settings.
    #[serde(default)]
    pub keepalive: KeepAliveConfig,
}

/// Settings for the link to the receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Advertised name of the bonded receiver.
    pub target_name: Option<String>,

    /// Address of the bonded receiver.
    pub target_address: Option<String>,

    /// Service the stream channel is opened against.
    pub service_uuid: Uuid,

    /// RFCOMM channel for sockets opened by channel number.
    pub rfcomm_channel: u8,

    /// Read buffer size in bytes.
    pub read_buffer_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            target_name: Some(DEFAULT_TARGET_NAME.to_string()),
            target_address: Some(DEFAULT_TARGET_ADDRESS.to_string()),
            service_uuid: SPP_UUID,
            rfcomm_channel: DEFAULT_RFCOMM_CHANNEL,
            read_buffer_size: READ_BUFFER_SIZE,
        }
    }
}

impl LinkConfig {
    /// Config targeting a receiver by name only.
    pub fn for_name(name: impl Into<String>) -> Self {
        Self {
            target_name: Some(name.into()),
            target_address: None,
            ..Self::default()
        }
    }

    /// Config targeting a receiver by address only.
    pub fn for_address(address: impl Into<String>) -> Self {
        Self {
            target_name: None,
            target_address: Some(address.into()),
            ..Self::default()
        }
    }

    /// Human-readable description of the configured target.
    pub fn target_label(&self) -> String {
        match (self.target_name.as_deref(), self.target_address.as_deref()) {
            (Some(name), Some(address)) => format!("'{}' ({})", name, address),
            (Some(name), None) => format!("'{}'", name),
            (None, Some(address)) => address.to_string(),
            (None, None) => "<no target>".to_string(),
        }
    }

    /// Check the settings before a manager is built from them.
    pub fn validate(&self) -> Result<(), LinkError> {
        let has_name = self.target_name.as_deref().is_some_and(|n| !n.trim().is_empty());
        let has_address = self
            .target_address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());

        if !has_name && !has_address {
            return Err(LinkError::InvalidConfig(
                "either target_name or target_address must be set".to_string(),
            ));
        }

        if self.read_buffer_size == 0 {
            return Err(LinkError::InvalidConfig(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }

        // RFCOMM channels are 1..=30
        if !(1..=30).contains(&self.rfcomm_channel) {
            return Err(LinkError::InvalidConfig(format!(
                "rfcomm_channel {} is out of range",
                self.rfcomm_channel
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Resend the last flight frame periodically while connected.
    pub enabled: bool,

    /// Resend interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
        }
    }
}

impl KeepAliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quadlink")
            .join("config.toml")
    }

    /// Load configuration from file or create default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            config
        };

        config.link.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.link.validate().is_ok());
        assert_eq!(config.link.service_uuid, SPP_UUID);
        assert_eq!(config.link.read_buffer_size, 1024);
        assert_eq!(config.keepalive.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_target_rejected() {
        let link = LinkConfig {
            target_name: Some("  ".to_string()),
            target_address: None,
            ..LinkConfig::default()
        };
        assert!(matches!(link.validate(), Err(LinkError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let link = LinkConfig {
            read_buffer_size: 0,
            ..LinkConfig::default()
        };
        assert!(link.validate().is_err());
    }

    #[test]
    fn test_channel_range() {
        let mut link = LinkConfig::default();
        link.rfcomm_channel = 0;
        assert!(link.validate().is_err());
        link.rfcomm_channel = 31;
        assert!(link.validate().is_err());
        link.rfcomm_channel = 30;
        assert!(link.validate().is_ok());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.link.target_name.as_deref(), Some("HC-06"));

        // Second load reads the file back
        let again = Config::load_from(&path).unwrap();
        assert_eq!(again.link.target_address, config.link.target_address);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[link]\ntarget_name = \"quadReceiver\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.link.target_name.as_deref(), Some("quadReceiver"));
        assert_eq!(config.link.rfcomm_channel, DEFAULT_RFCOMM_CHANNEL);
        assert!(config.keepalive.enabled);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[link]\nread_buffer_size = 0\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_target_label() {
        assert_eq!(LinkConfig::for_name("quad").target_label(), "'quad'");
        assert_eq!(LinkConfig::for_address("AA:BB").target_label(), "AA:BB");
    }
}
