use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::processor::AbsolutePositionRemap;

/// Represents all possible errors loading a [DeviceConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Host-side description of a lightgun device: the HID matching metadata and
/// the position-remap settings applied downstream of the report decoder. The
/// driver itself never consults this; it belongs to whatever is wiring the
/// driver up.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct DeviceConfig {
    pub name: String,
    pub vendor_id: u16,
    pub product_ids: Vec<u16>,
    #[serde(default)]
    pub remap: RemapConfig,
}

impl DeviceConfig {
    /// Load a [DeviceConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<DeviceConfig, LoadError> {
        let config: DeviceConfig = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load a [DeviceConfig] from the given YAML file
    pub fn from_yaml_file(path: String) -> Result<DeviceConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: DeviceConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }
}

/// Position-remap settings, mirroring [AbsolutePositionRemap]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "snake_case", default)]
pub struct RemapConfig {
    pub input_min_x: f32,
    pub input_max_x: f32,
    pub input_min_y: f32,
    pub input_max_y: f32,
    pub normalize_only: bool,
    pub invert_y: bool,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Default for RemapConfig {
    fn default() -> Self {
        let remap = AbsolutePositionRemap::default();
        Self {
            input_min_x: remap.input_min_x,
            input_max_x: remap.input_max_x,
            input_min_y: remap.input_min_y,
            input_max_y: remap.input_max_y,
            normalize_only: remap.normalize_only,
            invert_y: remap.invert_y,
            screen_width: remap.screen_width,
            screen_height: remap.screen_height,
        }
    }
}

impl From<&RemapConfig> for AbsolutePositionRemap {
    fn from(config: &RemapConfig) -> Self {
        Self {
            input_min_x: config.input_min_x,
            input_max_x: config.input_max_x,
            input_min_y: config.input_min_y,
            input_max_y: config.input_max_y,
            normalize_only: config.normalize_only,
            invert_y: config.invert_y,
            screen_width: config.screen_width,
            screen_height: config.screen_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_device_config() {
        let content = r#"
name: Blamcon Lightgun - P1
vendor_id: 13939
product_ids: [256, 257, 258, 259]
remap:
  input_max_x: 65535
  input_max_y: 65535
  normalize_only: true
"#;
        let config = DeviceConfig::from_yaml(content.to_string()).unwrap();
        assert_eq!(config.vendor_id, 0x3673);
        assert_eq!(config.product_ids, vec![0x0100, 0x0101, 0x0102, 0x0103]);
        assert_eq!(config.remap.input_max_x, 65535.0);
        assert!(config.remap.normalize_only);
        // Unset fields keep their defaults
        assert!(config.remap.invert_y);
        assert_eq!(config.remap.input_min_x, 0.0);
    }

    #[test]
    fn remap_defaults_when_missing() {
        let content = r#"
name: Blamcon Lightgun - P2
vendor_id: 13939
product_ids: [257]
"#;
        let config = DeviceConfig::from_yaml(content.to_string()).unwrap();
        let remap = AbsolutePositionRemap::from(&config.remap);
        assert_eq!(remap.input_max_x, 32767.0);
        assert!(!remap.normalize_only);
    }
}
