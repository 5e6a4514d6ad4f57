use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recording as listed by the backend.
///
/// The backend serializes its ORM model with capitalized keys; both that
/// form and plain snake_case are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Recording {
    #[serde(alias = "ID")]
    pub id: u64,

    #[serde(alias = "Filename")]
    pub filename: String,

    #[serde(default, alias = "Name")]
    pub name: Option<String>,

    #[serde(default, alias = "Notes")]
    pub notes: Option<String>,

    #[serde(default, alias = "Genre")]
    pub genre: Option<String>,

    #[serde(default, alias = "Protected")]
    pub protected: bool,

    #[serde(default, alias = "CreatedAt")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "SizeMB")]
    pub size_mb: Option<f64>,
}

impl Recording {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.filename)
    }
}

/// Body of a metadata update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingEdit {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub genre: Option<String>,
}
