/// Commands for the Transport service
#[derive(Debug)]
pub enum TransportCommand {
    Send(String),
    Close,
}

/// Events the Transport service reports to the app loop
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Message(String),
}

/// Work the app loop schedules for itself
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    RefreshRecordings,
}
