use crate::model::{AudioCapabilities, OperationalState, Recording};
use crate::store::PanelState;

/// Severity of a usage gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageLevel {
    pub fn from_percent(percent: f64) -> Self {
        let percent = clamp_percent(percent);
        if percent > 90.0 {
            UsageLevel::Critical
        } else if percent > 75.0 {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        }
    }
}

pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

pub const RECORDINGS_PATH: &str = "/recordings/";

pub fn recording_url(filename: &str) -> String {
    format!("{RECORDINGS_PATH}{}", urlencoding::encode(filename))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIcon {
    Play,
    Pause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackAction {
    Play(String),
    Pause,
}

/// Which recording is loaded in the player and whether it is playing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackTracker {
    playing_file: Option<String>,
    is_playing: bool,
}

impl PlaybackTracker {
    pub fn playing_file(&self) -> Option<&str> {
        self.playing_file.as_deref()
    }

    /// Play/pause button pressed on `filename`.
    pub fn toggle(&mut self, filename: &str) -> PlaybackAction {
        let url = recording_url(filename);
        if self.is_playing && self.playing_file.as_deref() == Some(url.as_str()) {
            return PlaybackAction::Pause;
        }
        self.playing_file = Some(url.clone());
        PlaybackAction::Play(url)
    }

    pub fn on_play(&mut self) {
        self.is_playing = true;
    }

    pub fn on_pause(&mut self) {
        self.is_playing = false;
    }

    pub fn on_ended(&mut self) {
        self.is_playing = false;
        self.playing_file = None;
    }

    pub fn on_error(&mut self) {
        self.on_ended();
    }

    pub fn icon_for(&self, filename: &str) -> PlaybackIcon {
        let url = recording_url(filename);
        if self.is_playing && self.playing_file.as_deref() == Some(url.as_str()) {
            PlaybackIcon::Pause
        } else {
            PlaybackIcon::Play
        }
    }
}

pub fn can_delete(recording: &Recording) -> bool {
    !recording.protected
}

pub fn stream_badge(live: bool) -> &'static str {
    if live { "LIVE" } else { "OFFLINE" }
}

pub fn recording_badge(recording: bool) -> &'static str {
    if recording { "RECORDING" } else { "IDLE" }
}

const STANDARD_RATES: [u32; 3] = [44100, 48000, 96000];
const STANDARD_DEPTHS: [u32; 3] = [16, 24, 32];

/// A choice in a select list; disabled when the device does not report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub value: u32,
    pub enabled: bool,
}

fn merge_options(standard: &[u32], reported: &[u32]) -> Vec<SelectOption> {
    let mut values: Vec<u32> = standard
        .iter()
        .chain(reported)
        .copied()
        .filter(|v| *v > 0)
        .collect();
    values.sort_unstable();
    values.dedup();

    values
        .into_iter()
        .map(|value| SelectOption {
            value,
            enabled: reported.is_empty() || reported.contains(&value),
        })
        .collect()
}

pub fn sample_rate_options(caps: &AudioCapabilities) -> Vec<SelectOption> {
    merge_options(&STANDARD_RATES, &caps.rates)
}

pub fn bit_depth_options(caps: &AudioCapabilities) -> Vec<SelectOption> {
    let depths: Vec<u32> = caps.depths.iter().map(|d| u32::from(*d)).collect();
    merge_options(&STANDARD_DEPTHS, &depths)
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = (size * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, UNITS[unit])
    }
}

/// One-line summary of the panel, for logs and terminals.
pub fn summary(state: &PanelState) -> String {
    let status = &state.status;
    let link = if state.connected { "online" } else { "offline" };
    let mode = match status.operational_state() {
        OperationalState::Idle => "idle",
        OperationalState::Recording => "recording",
        OperationalState::Streaming => "streaming",
        OperationalState::RecordingAndStreaming => "recording+streaming",
    };
    let recordings = state
        .recordings
        .as_ref()
        .map_or_else(|| "loading".to_string(), |r| r.len().to_string());

    let mut line = format!(
        "[{link}] {mode} | SRT {} | Icecast {} ({}/{}) | disk {:.0}% | recordings {recordings}",
        stream_badge(status.is_streaming_srt),
        stream_badge(status.is_streaming_icecast),
        status.listeners,
        status.listener_peak,
        clamp_percent(status.disk_usage_percent),
    );

    if let Some(file) = status.current_recording_file.as_deref().filter(|_| status.is_recording) {
        line.push_str(&format!(" | file {file}"));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_thresholds() {
        assert_eq!(UsageLevel::from_percent(0.0), UsageLevel::Normal);
        assert_eq!(UsageLevel::from_percent(75.0), UsageLevel::Normal);
        assert_eq!(UsageLevel::from_percent(75.5), UsageLevel::Warning);
        assert_eq!(UsageLevel::from_percent(90.0), UsageLevel::Warning);
        assert_eq!(UsageLevel::from_percent(91.0), UsageLevel::Critical);
        assert_eq!(UsageLevel::from_percent(250.0), UsageLevel::Critical);
        assert_eq!(UsageLevel::from_percent(-5.0), UsageLevel::Normal);
        assert_eq!(UsageLevel::from_percent(f64::NAN), UsageLevel::Normal);
    }

    #[test]
    fn test_playback_toggle() {
        let mut player = PlaybackTracker::default();

        assert_eq!(
            player.toggle("a.flac"),
            PlaybackAction::Play("/recordings/a.flac".to_string())
        );
        player.on_play();
        assert_eq!(player.icon_for("a.flac"), PlaybackIcon::Pause);
        assert_eq!(player.icon_for("b.flac"), PlaybackIcon::Play);

        assert_eq!(player.toggle("a.flac"), PlaybackAction::Pause);
        player.on_pause();
        assert_eq!(player.icon_for("a.flac"), PlaybackIcon::Play);

        // Paused file resumes rather than pausing again.
        assert_eq!(
            player.toggle("a.flac"),
            PlaybackAction::Play("/recordings/a.flac".to_string())
        );

        player.on_play();
        assert_eq!(
            player.toggle("b.flac"),
            PlaybackAction::Play("/recordings/b.flac".to_string())
        );

        player.on_ended();
        assert_eq!(player.playing_file(), None);
    }

    #[test]
    fn test_recording_url_encodes_filename() {
        assert_eq!(recording_url("a.flac"), "/recordings/a.flac");
        assert_eq!(
            recording_url("show #3 ?.flac"),
            "/recordings/show%20%233%20%3F.flac"
        );
    }

    #[test]
    fn test_options_from_capabilities() {
        let none = AudioCapabilities::default();
        let options = sample_rate_options(&none);
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|o| o.enabled));

        let caps = AudioCapabilities {
            rates: vec![48000, 192000],
            depths: vec![24],
        };
        let options = sample_rate_options(&caps);
        let values: Vec<u32> = options.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![44100, 48000, 96000, 192000]);
        let enabled: Vec<u32> = options.iter().filter(|o| o.enabled).map(|o| o.value).collect();
        assert_eq!(enabled, vec![48000, 192000]);

        let depths = bit_depth_options(&caps);
        assert_eq!(depths.iter().filter(|o| o.enabled).count(), 1);
    }

    #[test]
    fn test_protected_recordings_cannot_be_deleted() {
        let mut rec: Recording =
            serde_json::from_str(r#"{"id": 1, "filename": "a.flac"}"#).unwrap();
        assert!(can_delete(&rec));
        rec.protected = true;
        assert!(!can_delete(&rec));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
    }

    #[test]
    fn test_summary() {
        let mut state = PanelState::default();
        assert!(summary(&state).starts_with("[offline] idle"));
        assert!(summary(&state).ends_with("recordings loading"));

        state.connected = true;
        state.status.is_recording = true;
        state.status.current_recording_file = Some("a.flac".to_string());
        state.recordings = Some(Vec::new());
        let line = summary(&state);
        assert!(line.starts_with("[online] recording"));
        assert!(line.contains("recordings 0"));
        assert!(line.ends_with("file a.flac"));
    }
}
