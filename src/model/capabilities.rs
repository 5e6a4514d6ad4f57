use serde::{Deserialize, Serialize};

/// Sample rates and bit depths a capture device reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AudioCapabilities {
    #[serde(default)]
    pub rates: Vec<u32>,
    #[serde(default)]
    pub depths: Vec<u16>,
}

impl AudioCapabilities {
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty() && self.depths.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api: String,
    #[serde(default)]
    pub device_class: String,
}

/// Devices without a concrete name have no queryable capabilities.
pub fn is_queryable_device(device: &str) -> bool {
    let device = device.trim();
    !device.is_empty() && device != "default"
}
