pub mod app;
pub mod config;
pub mod messages;
pub mod model;
pub mod net;
pub mod protocol;
pub mod services;
pub mod store;
pub mod view;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use config::Config;
pub use services::{Dispatcher, StreamProtocol, TransportHandle};
pub use store::{PanelState, StateStore};
