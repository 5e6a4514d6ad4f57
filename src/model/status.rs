use serde::{Deserialize, Deserializer, Serialize};

/// Last-known appliance status, as pushed over the socket.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppStatus {
    pub is_recording: bool,
    pub is_streaming_srt: bool,
    pub is_streaming_icecast: bool,
    pub current_recording_file: Option<String>,
    pub disk_usage_percent: f64,
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub listeners: u32,
    pub listener_peak: u32,
}

/// Partial status update. Absent fields keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusPatch {
    #[serde(default)]
    pub is_recording: Option<bool>,
    #[serde(default)]
    pub is_streaming_srt: Option<bool>,
    #[serde(default)]
    pub is_streaming_icecast: Option<bool>,
    /// `Some(None)` when the diff carries an explicit null.
    #[serde(default, deserialize_with = "explicit_null")]
    pub current_recording_file: Option<Option<String>>,
    #[serde(default, alias = "disk_usage")]
    pub disk_usage_percent: Option<f64>,
    #[serde(default)]
    pub cpu_usage_percent: Option<f64>,
    #[serde(default)]
    pub memory_usage_percent: Option<f64>,
    #[serde(default, alias = "listener_current")]
    pub listeners: Option<u32>,
    #[serde(default)]
    pub listener_peak: Option<u32>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationalState {
    Idle,
    Recording,
    Streaming,
    RecordingAndStreaming,
}

/// What a merge changed that callers need to react to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusChange {
    pub changed: bool,
    pub recording_stopped: bool,
}

impl AppStatus {
    pub fn is_streaming(&self) -> bool {
        self.is_streaming_srt || self.is_streaming_icecast
    }

    pub fn operational_state(&self) -> OperationalState {
        match (self.is_recording, self.is_streaming()) {
            (false, false) => OperationalState::Idle,
            (true, false) => OperationalState::Recording,
            (false, true) => OperationalState::Streaming,
            (true, true) => OperationalState::RecordingAndStreaming,
        }
    }

    pub fn merge(&mut self, patch: StatusPatch) -> StatusChange {
        let before = self.clone();
        let was_recording = self.is_recording;

        if let Some(v) = patch.is_recording {
            self.is_recording = v;
        }
        if let Some(v) = patch.is_streaming_srt {
            self.is_streaming_srt = v;
        }
        if let Some(v) = patch.is_streaming_icecast {
            self.is_streaming_icecast = v;
        }
        if let Some(v) = patch.current_recording_file {
            self.current_recording_file = v.filter(|f| !f.is_empty());
        }
        if let Some(v) = patch.disk_usage_percent {
            self.disk_usage_percent = v;
        }
        if let Some(v) = patch.cpu_usage_percent {
            self.cpu_usage_percent = v;
        }
        if let Some(v) = patch.memory_usage_percent {
            self.memory_usage_percent = v;
        }
        if let Some(v) = patch.listeners {
            self.listeners = v;
        }
        if let Some(v) = patch.listener_peak {
            self.listener_peak = v;
        }

        StatusChange {
            changed: *self != before,
            recording_stopped: was_recording && !self.is_recording,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_patch_keeps_other_fields() {
        let mut status = AppStatus {
            is_streaming_icecast: true,
            disk_usage_percent: 42.0,
            listeners: 3,
            listener_peak: 7,
            ..AppStatus::default()
        };

        let patch: StatusPatch = serde_json::from_str(r#"{"listener_current": 5}"#).unwrap();
        let change = status.merge(patch);

        assert!(change.changed);
        assert_eq!(status.listeners, 5);
        assert_eq!(status.listener_peak, 7);
        assert_eq!(status.disk_usage_percent, 42.0);
        assert!(status.is_streaming_icecast);
    }

    #[test]
    fn test_recording_stopped_edge() {
        let mut status = AppStatus::default();

        let start = StatusPatch {
            is_recording: Some(true),
            current_recording_file: Some(Some("2024-05-01_10-00.flac".to_string())),
            ..StatusPatch::default()
        };
        assert!(!status.merge(start).recording_stopped);

        let stop = StatusPatch {
            is_recording: Some(false),
            ..StatusPatch::default()
        };
        assert!(status.merge(stop.clone()).recording_stopped);

        // Already stopped: no second edge.
        assert!(!status.merge(stop).recording_stopped);
    }

    #[test]
    fn test_recording_file_cleared_by_null_or_empty() {
        let mut status = AppStatus {
            current_recording_file: Some("a.flac".to_string()),
            ..AppStatus::default()
        };

        let absent: StatusPatch = serde_json::from_str(r#"{"is_recording": true}"#).unwrap();
        status.merge(absent);
        assert_eq!(status.current_recording_file.as_deref(), Some("a.flac"));

        let null: StatusPatch =
            serde_json::from_str(r#"{"current_recording_file": null}"#).unwrap();
        assert_eq!(null.current_recording_file, Some(None));
        status.merge(null);
        assert_eq!(status.current_recording_file, None);

        status.current_recording_file = Some("b.flac".to_string());
        let empty: StatusPatch = serde_json::from_str(r#"{"current_recording_file": ""}"#).unwrap();
        status.merge(empty);
        assert_eq!(status.current_recording_file, None);
    }

    #[test]
    fn test_unchanged_patch() {
        let mut status = AppStatus::default();
        let change = status.merge(StatusPatch {
            is_recording: Some(false),
            ..StatusPatch::default()
        });
        assert!(!change.changed);
    }

    #[test]
    fn test_operational_state() {
        let mut status = AppStatus::default();
        assert_eq!(status.operational_state(), OperationalState::Idle);

        status.is_streaming_srt = true;
        assert_eq!(status.operational_state(), OperationalState::Streaming);

        status.is_recording = true;
        assert_eq!(
            status.operational_state(),
            OperationalState::RecordingAndStreaming
        );
    }
}
