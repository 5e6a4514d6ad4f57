use anyhow::Result;
use async_trait::async_trait;

/// Opens push-channel connections to the backend.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// One open push-channel session.
#[async_trait]
pub trait Connection: Send {
    /// Next text payload. `None` once the peer has closed or the link failed.
    async fn recv(&mut self) -> Option<String>;

    async fn send(&mut self, text: String) -> Result<()>;

    async fn close(&mut self);
}
