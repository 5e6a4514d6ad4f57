pub mod backend;
pub mod connector;
pub mod http;
pub mod ws;

pub use backend::{ApiRequest, ApiResponse, Backend, Method};
pub use connector::{Connection, Connector};
pub use http::HttpBackend;
pub use ws::WsConnector;
