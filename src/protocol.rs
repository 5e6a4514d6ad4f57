use crate::model::{Recording, Settings, StatusPatch};
use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// A push update from the backend socket.
///
/// Two shapes are in circulation: an envelope carrying any of
/// `status`/`config`/`recordings`, and a bare object that is either a
/// status diff or (when it carries `audio_settings`) a full config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerMessage {
    pub status: Option<StatusPatch>,
    pub config: Option<Settings>,
    pub recordings: Option<Vec<Recording>>,
}

const ENVELOPE_KEYS: [&str; 3] = ["status", "config", "recordings"];

pub fn decode(text: &str) -> Result<ServerMessage> {
    let value: Value = serde_json::from_str(text).context("Message is not valid JSON")?;

    let Value::Object(object) = value else {
        return Err(anyhow::anyhow!("Message is not a JSON object"));
    };

    if ENVELOPE_KEYS.iter().any(|k| object.contains_key(*k)) {
        return decode_envelope(object);
    }

    if object.contains_key("audio_settings") {
        let config = Settings::from_value(Value::Object(object))?;
        return Ok(ServerMessage {
            config: Some(config),
            ..ServerMessage::default()
        });
    }

    let status: StatusPatch = serde_json::from_value(Value::Object(object))
        .context("Message is not a status update")?;

    Ok(ServerMessage {
        status: Some(status),
        ..ServerMessage::default()
    })
}

fn decode_envelope(mut object: Map<String, Value>) -> Result<ServerMessage> {
    let status = match object.remove("status") {
        Some(Value::Null) | None => None,
        Some(v) => Some(serde_json::from_value(v).context("Invalid status in envelope")?),
    };

    let config = match object.remove("config") {
        Some(Value::Null) | None => None,
        Some(v) => Some(Settings::from_value(v).context("Invalid config in envelope")?),
    };

    let recordings = match object.remove("recordings") {
        Some(Value::Null) | None => None,
        Some(v) => Some(serde_json::from_value(v).context("Invalid recordings in envelope")?),
    };

    Ok(ServerMessage {
        status,
        config,
        recordings,
    })
}
