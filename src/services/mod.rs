pub mod dispatcher;
pub mod transport;

pub use dispatcher::{Dispatcher, StreamProtocol};
pub use transport::{Transport, TransportHandle};
