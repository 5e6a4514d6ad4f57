use crate::model::{AppStatus, AudioCapabilities, Recording, Settings, StatusChange, StatusPatch};
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of everything the panel knows about the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub connected: bool,
    pub status: AppStatus,
    /// Authoritative settings as last fetched or pushed.
    pub settings: Option<Settings>,
    /// Local edits not yet saved.
    pub settings_draft: Option<Settings>,
    /// `None` until the first listing arrives.
    pub recordings: Option<Vec<Recording>>,
    pub capabilities: AudioCapabilities,
}

impl PanelState {
    /// Settings as the user currently sees them: the draft if any.
    pub fn effective_settings(&self) -> Option<&Settings> {
        self.settings_draft.as_ref().or(self.settings.as_ref())
    }
}

/// Shared state store. Every mutation goes through the watch channel so
/// observers always see a consistent snapshot.
#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<PanelState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PanelState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PanelState {
        self.tx.borrow().clone()
    }

    pub fn status(&self) -> AppStatus {
        self.tx.borrow().status.clone()
    }

    pub fn settings(&self) -> Option<Settings> {
        self.tx.borrow().settings.clone()
    }

    pub fn recordings(&self) -> Option<Vec<Recording>> {
        self.tx.borrow().recordings.clone()
    }

    pub fn capabilities(&self) -> AudioCapabilities {
        self.tx.borrow().capabilities.clone()
    }

    pub fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|state| {
            let changed = state.connected != connected;
            state.connected = connected;
            changed
        });
    }

    pub fn apply_status(&self, patch: StatusPatch) -> StatusChange {
        let mut change = StatusChange::default();
        self.tx.send_if_modified(|state| {
            change = state.status.merge(patch);
            change.changed
        });
        change
    }

    /// Replace the authoritative settings. Pending local edits are kept.
    pub fn set_settings(&self, settings: Settings) {
        self.tx.send_modify(|state| state.settings = Some(settings));
    }

    /// Apply `edit` to the draft, starting it from the authoritative copy.
    pub fn edit_draft<T>(
        &self,
        edit: impl FnOnce(&mut Settings) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let mut result = Err(anyhow::anyhow!("Settings have not been loaded yet"));
        self.tx.send_if_modified(|state| {
            let Some(base) = state.settings_draft.as_ref().or(state.settings.as_ref()) else {
                return false;
            };
            let mut draft = base.clone();
            result = edit(&mut draft);
            if result.is_ok() {
                state.settings_draft = Some(draft);
                true
            } else {
                false
            }
        });
        result
    }

    pub fn draft(&self) -> Option<Settings> {
        self.tx.borrow().effective_settings().cloned()
    }

    pub fn clear_draft(&self) {
        self.tx.send_if_modified(|state| state.settings_draft.take().is_some());
    }

    pub fn set_recordings(&self, recordings: Vec<Recording>) {
        self.tx.send_modify(|state| state.recordings = Some(recordings));
    }

    /// Leave the view's loading state without discarding a known list.
    pub fn mark_recordings_unavailable(&self) {
        self.tx.send_if_modified(|state| {
            if state.recordings.is_none() {
                state.recordings = Some(Vec::new());
                true
            } else {
                false
            }
        });
    }

    pub fn set_capabilities(&self, capabilities: AudioCapabilities) {
        self.tx.send_if_modified(|state| {
            let changed = state.capabilities != capabilities;
            state.capabilities = capabilities;
            changed
        });
    }
}
