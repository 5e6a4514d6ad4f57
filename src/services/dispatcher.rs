use crate::model::capabilities::is_queryable_device;
use crate::model::{AudioCapabilities, AudioDevice, Recording, RecordingEdit, Settings};
use crate::net::{ApiRequest, ApiResponse, Backend, Method};
use crate::store::StateStore;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamProtocol {
    Srt,
    Icecast,
}

impl StreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamProtocol::Srt => "srt",
            StreamProtocol::Icecast => "icecast",
        }
    }

    fn section(&self) -> &'static str {
        match self {
            StreamProtocol::Srt => "srt_settings",
            StreamProtocol::Icecast => "icecast_settings",
        }
    }
}

/// Turns user intents into REST calls and keeps the store in sync with
/// what the backend reports afterwards.
///
/// Mutations are never applied to the store directly. Every call, successful
/// or not, is followed by a re-fetch of the affected slice.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    store: StateStore,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>, store: StateStore) -> Self {
        Self { backend, store }
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let label = format!("{} /api/{}", request.method, request.path);

        let response = match self.backend.call(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("API call {} failed: {:#}", label, e);
                return Err(e);
            }
        };

        if !response.is_success() {
            tracing::error!(
                "API error on {}: {} {}",
                label,
                response.status,
                response.body.trim()
            );
            return Err(anyhow::anyhow!("{} returned HTTP {}", label, response.status));
        }

        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let label = format!("{} /api/{}", request.method, request.path);
        let response = self.execute(request).await?;

        serde_json::from_str(&response.body).map_err(|e| {
            tracing::error!("Failed to parse response from {}: {}", label, e);
            anyhow::anyhow!("Invalid response from {}: {}", label, e)
        })
    }

    // ------------------------------------------------------------------
    // Fetches
    // ------------------------------------------------------------------

    pub async fn refresh_settings(&self) -> Result<()> {
        let value: Value = self.fetch_json(ApiRequest::get("config")).await?;
        let settings = Settings::from_value(value).context("Backend returned invalid config")?;
        self.store.set_settings(settings);
        Ok(())
    }

    pub async fn refresh_recordings(&self) -> Result<()> {
        match self
            .fetch_json::<Vec<Recording>>(ApiRequest::get("recordings"))
            .await
        {
            Ok(recordings) => {
                tracing::debug!("Fetched {} recordings", recordings.len());
                self.store.set_recordings(recordings);
                Ok(())
            }
            Err(e) => {
                self.store.mark_recordings_unavailable();
                Err(e)
            }
        }
    }

    pub async fn refresh_capabilities(&self, device: &str) -> Result<()> {
        if !is_queryable_device(device) {
            self.store.set_capabilities(AudioCapabilities::default());
            return Ok(());
        }

        let request = ApiRequest::get("capabilities").with_query("device", device);
        match self.fetch_json::<AudioCapabilities>(request).await {
            Ok(caps) => {
                self.store.set_capabilities(caps);
                Ok(())
            }
            Err(e) => {
                self.store.set_capabilities(AudioCapabilities::default());
                Err(e)
            }
        }
    }

    pub async fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        self.fetch_json(ApiRequest::get("devices")).await
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Apply one field edit to the local draft. Changing the capture
    /// device also refreshes its capabilities.
    pub async fn edit_setting(&self, path: &str, raw: &str) -> Result<Value> {
        let value = self.store.edit_draft(|s| s.set_field(path, raw))?;

        if path == "audio_settings.device" {
            if let Err(e) = self.refresh_capabilities(raw).await {
                tracing::warn!("Could not load capabilities for {}: {:#}", raw, e);
            }
        }

        Ok(value)
    }

    /// Submit the draft wholesale and re-fetch the authoritative copy. The
    /// draft is dropped on success and kept on failure.
    pub async fn save_settings(&self) -> Result<()> {
        let settings = self
            .store
            .draft()
            .context("Settings have not been loaded yet")?;

        let request = ApiRequest::post("config").with_body(settings.into_value());
        if let Err(e) = self.execute(request).await {
            if let Err(refresh) = self.refresh_settings().await {
                tracing::warn!("Could not re-fetch settings after failed save: {:#}", refresh);
            }
            return Err(e);
        }

        tracing::info!("Settings saved");
        self.store.clear_draft();
        if let Err(e) = self.refresh_settings().await {
            tracing::warn!("Saved settings but could not re-fetch them: {:#}", e);
        }
        Ok(())
    }

    pub fn discard_settings_draft(&self) {
        self.store.clear_draft();
    }

    pub async fn toggle_auto_record(&self) -> Result<()> {
        let enabled = self
            .store
            .draft()
            .context("Settings have not been loaded yet")?
            .auto_record_enabled();

        self.store
            .edit_draft(|s| s.set("auto_record.enabled", Value::Bool(!enabled)))?;
        self.save_settings().await
    }

    // ------------------------------------------------------------------
    // Live controls
    // ------------------------------------------------------------------

    pub async fn set_stream(&self, protocol: StreamProtocol, enabled: bool) -> Result<()> {
        let body = json!({ "stream": protocol.as_str(), "enabled": enabled });
        self.execute(ApiRequest::post("stream").with_body(body)).await?;
        tracing::info!(
            "{} stream {}",
            protocol.as_str(),
            if enabled { "start requested" } else { "stop requested" }
        );
        Ok(())
    }

    /// Flip a stream relative to the last known status. Returns false
    /// without calling the backend when settings are not loaded yet.
    pub async fn toggle_stream(&self, protocol: StreamProtocol) -> Result<bool> {
        let snapshot = self.store.snapshot();
        let configured = snapshot
            .settings
            .as_ref()
            .is_some_and(|s| s.has_section(protocol.section()));
        if !configured {
            tracing::debug!("Ignoring {} toggle: settings not loaded", protocol.as_str());
            return Ok(false);
        }

        let live = match protocol {
            StreamProtocol::Srt => snapshot.status.is_streaming_srt,
            StreamProtocol::Icecast => snapshot.status.is_streaming_icecast,
        };
        self.set_stream(protocol, !live).await?;
        Ok(true)
    }

    pub async fn start_recording(&self) -> Result<()> {
        self.execute(ApiRequest::post("record/start")).await?;
        Ok(())
    }

    pub async fn stop_recording(&self) -> Result<()> {
        self.execute(ApiRequest::post("record/stop")).await?;
        Ok(())
    }

    /// Close the current file and continue into a new one.
    pub async fn split_recording(&self) -> Result<()> {
        if !self.store.status().is_recording {
            return Err(anyhow::anyhow!("Cannot split: not recording"));
        }
        self.execute(ApiRequest::post("record/split")).await?;
        Ok(())
    }

    pub async fn toggle_recording(&self) -> Result<()> {
        if self.store.status().is_recording {
            self.stop_recording().await
        } else {
            self.start_recording().await
        }
    }

    // ------------------------------------------------------------------
    // Recordings
    // ------------------------------------------------------------------

    pub async fn update_recording(&self, id: u64, edit: RecordingEdit) -> Result<()> {
        let body = serde_json::to_value(&edit).context("Failed to serialize recording edit")?;
        let request = ApiRequest::new(Method::Put, format!("recordings/{id}")).with_body(body);
        self.mutate_recordings(request).await
    }

    pub async fn delete_recording(&self, id: u64) -> Result<()> {
        let protected = self
            .store
            .recordings()
            .unwrap_or_default()
            .iter()
            .any(|r| r.id == id && r.protected);
        if protected {
            return Err(anyhow::anyhow!("Recording {} is protected", id));
        }

        let request = ApiRequest::new(Method::Delete, format!("recordings/{id}"));
        self.mutate_recordings(request).await
    }

    pub async fn toggle_protect(&self, id: u64) -> Result<()> {
        self.mutate_recordings(ApiRequest::post(format!("recordings/{id}/protect")))
            .await
    }

    async fn mutate_recordings(&self, request: ApiRequest) -> Result<()> {
        let result = self.execute(request).await.map(|_| ());
        if let Err(e) = self.refresh_recordings().await {
            tracing::warn!("Recording list refresh after change failed: {:#}", e);
        }
        result
    }
}
