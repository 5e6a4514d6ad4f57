use anyhow::Result;
use serde_json::Value;

/// How a settings field's raw text input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    IntList,
}

pub struct FieldDescriptor {
    pub path: &'static str,
    pub kind: FieldKind,
    pub validate: fn(&Value) -> Result<()>,
}

const DEFAULT_CHANNELS: [i64; 2] = [1, 2];

pub const FIELDS: &[FieldDescriptor] = &[
    field("audio_settings.device", FieldKind::Text, any),
    field("audio_settings.sample_rate", FieldKind::Int, positive),
    field("audio_settings.bit_depth", FieldKind::Int, bit_depth),
    field("audio_settings.master_channels", FieldKind::IntList, any),
    field("auto_record.enabled", FieldKind::Bool, any),
    field("auto_record.smart_split_enabled", FieldKind::Bool, any),
    field("auto_record.directory", FieldKind::Text, non_empty),
    field("auto_record.preroll_duration", FieldKind::Int, non_negative),
    field("auto_record.smart_split_timeout", FieldKind::Int, non_negative),
    field("auto_record.vad_db_threshold", FieldKind::Float, decibels),
    field("icecast_settings.icecast_enabled", FieldKind::Bool, any),
    field("icecast_settings.icecast_host", FieldKind::Text, any),
    field("icecast_settings.icecast_port", FieldKind::Int, port),
    field("icecast_settings.icecast_mount", FieldKind::Text, mount),
    field("icecast_settings.icecast_user", FieldKind::Text, any),
    field("icecast_settings.icecast_password", FieldKind::Text, any),
    field("icecast_settings.icecast_bitrate", FieldKind::Int, positive),
    field("srt_settings.srt_enabled", FieldKind::Bool, any),
    field("srt_settings.srt_host", FieldKind::Text, any),
    field("srt_settings.srt_port", FieldKind::Int, port),
    field("srt_settings.srt_bitrate", FieldKind::Int, positive),
    field("network_settings.signaling_url", FieldKind::Text, url_or_empty),
    field("network_settings.stun_url", FieldKind::Text, url_or_empty),
];

const fn field(
    path: &'static str,
    kind: FieldKind,
    validate: fn(&Value) -> Result<()>,
) -> FieldDescriptor {
    FieldDescriptor {
        path,
        kind,
        validate,
    }
}

pub fn lookup(path: &str) -> Option<&'static FieldDescriptor> {
    FIELDS.iter().find(|f| f.path == path)
}

impl FieldDescriptor {
    /// Parse raw input into a JSON value and validate it.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        let value = match self.kind {
            FieldKind::Bool => Value::Bool(parse_bool(raw)?),
            FieldKind::Int => {
                let n = leading_float(raw).map_or(0, |n| n.round() as i64);
                Value::from(n)
            }
            FieldKind::Float => Value::from(leading_float(raw).unwrap_or(0.0)),
            FieldKind::Text => Value::String(raw.to_string()),
            FieldKind::IntList => {
                let mut list: Vec<i64> = raw
                    .split(',')
                    .filter_map(leading_int)
                    .filter(|n| *n > 0)
                    .collect();
                if list.is_empty() {
                    list = DEFAULT_CHANNELS.to_vec();
                }
                Value::from(list)
            }
        };

        (self.validate)(&value)
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", self.path, e))?;

        Ok(value)
    }
}

/// Longest numeric prefix of `raw`, so `"48000Hz"` reads as 48000.
fn leading_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    (1..=s.len())
        .rev()
        .filter(|end| s.is_char_boundary(*end))
        .find_map(|end| s[..end].parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && matches!(c, '-' | '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

pub fn default_master_channels() -> Value {
    Value::from(DEFAULT_CHANNELS.to_vec())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        other => Err(anyhow::anyhow!("'{}' is not a boolean", other)),
    }
}

fn any(_: &Value) -> Result<()> {
    Ok(())
}

fn positive(v: &Value) -> Result<()> {
    match v.as_i64() {
        Some(n) if n > 0 => Ok(()),
        _ => Err(anyhow::anyhow!("must be greater than zero")),
    }
}

fn non_negative(v: &Value) -> Result<()> {
    match v.as_i64() {
        Some(n) if n >= 0 => Ok(()),
        _ => Err(anyhow::anyhow!("must not be negative")),
    }
}

fn bit_depth(v: &Value) -> Result<()> {
    match v.as_i64() {
        Some(16 | 24 | 32) => Ok(()),
        _ => Err(anyhow::anyhow!("must be 16, 24 or 32")),
    }
}

fn port(v: &Value) -> Result<()> {
    match v.as_i64() {
        Some(n) if (1..=65535).contains(&n) => Ok(()),
        _ => Err(anyhow::anyhow!("must be between 1 and 65535")),
    }
}

fn decibels(v: &Value) -> Result<()> {
    match v.as_f64() {
        Some(n) if (-120.0..=0.0).contains(&n) => Ok(()),
        _ => Err(anyhow::anyhow!("must be between -120 and 0 dB")),
    }
}

fn non_empty(v: &Value) -> Result<()> {
    match v.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(anyhow::anyhow!("must not be empty")),
    }
}

fn mount(v: &Value) -> Result<()> {
    match v.as_str() {
        Some(s) if s.starts_with('/') => Ok(()),
        _ => Err(anyhow::anyhow!("must start with '/'")),
    }
}

fn url_or_empty(v: &Value) -> Result<()> {
    let s = v.as_str().unwrap_or_default().trim();
    if s.is_empty() || s.contains("://") || s.starts_with("stun:") || s.starts_with("turn:") {
        Ok(())
    } else {
        Err(anyhow::anyhow!("'{}' is not a URL", s))
    }
}
