use super::fields;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SECTIONS: [&str; 5] = [
    "audio_settings",
    "auto_record",
    "srt_settings",
    "icecast_settings",
    "network_settings",
];

/// Backend configuration tree.
///
/// Held as raw JSON so keys this client does not know about survive a
/// fetch/save round trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut settings = Self(map);
                settings.normalize();
                Ok(settings)
            }
            other => Err(anyhow::anyhow!(
                "Settings must be a JSON object, got {}",
                other
            )),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Ensure every known section exists and master channels is an array.
    pub fn normalize(&mut self) {
        for section in SECTIONS {
            let entry = self
                .0
                .entry(section)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
        }

        if let Some(Value::Object(audio)) = self.0.get_mut("audio_settings") {
            let channels = audio.get("master_channels");
            if !matches!(channels, Some(Value::Array(_))) {
                audio.insert(
                    "master_channels".to_string(),
                    fields::default_master_channels(),
                );
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut keys = path.split('.');
        let mut current = self.0.get(keys.next()?)?;
        for key in keys {
            current = current.as_object()?.get(key)?;
        }
        Some(current)
    }

    /// Set a nested value by dotted path, creating intermediate objects.
    /// Siblings along the path are left untouched.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let keys: Vec<&str> = path.split('.').collect();
        if keys.iter().any(|k| k.is_empty()) {
            return Err(anyhow::anyhow!("Invalid settings path: '{}'", path));
        }

        let (last, parents) = keys
            .split_last()
            .context("Settings path must not be empty")?;

        let mut current = &mut self.0;
        for key in parents {
            let entry = current
                .entry(*key)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = entry
                .as_object_mut()
                .with_context(|| format!("Cannot descend into '{}'", key))?;
        }

        current.insert((*last).to_string(), value);
        Ok(())
    }

    /// Parse raw input through the field table and apply it.
    pub fn set_field(&mut self, path: &str, raw: &str) -> Result<Value> {
        let descriptor =
            fields::lookup(path).with_context(|| format!("Unknown settings field: {}", path))?;
        let value = descriptor.parse(raw)?;
        self.set(path, value.clone())?;
        Ok(value)
    }

    fn flag(&self, path: &str) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn audio_device(&self) -> Option<&str> {
        self.get("audio_settings.device").and_then(Value::as_str)
    }

    pub fn auto_record_enabled(&self) -> bool {
        self.flag("auto_record.enabled")
    }

    pub fn srt_enabled(&self) -> bool {
        self.flag("srt_settings.srt_enabled")
    }

    pub fn icecast_enabled(&self) -> bool {
        self.flag("icecast_settings.icecast_enabled")
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.0.get(section).is_some_and(Value::is_object)
    }
}
