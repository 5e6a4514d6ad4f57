pub mod capabilities;
pub mod fields;
pub mod recording;
pub mod settings;
pub mod status;

pub use capabilities::{AudioCapabilities, AudioDevice};
pub use recording::{Recording, RecordingEdit};
pub use settings::Settings;
pub use status::{AppStatus, OperationalState, StatusChange, StatusPatch};
