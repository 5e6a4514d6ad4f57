use super::connector::{Connection, Connector};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// WebSocket connector for the backend's `/ws` endpoint.
pub struct WsConnector {
    url: Url,
}

impl WsConnector {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let (stream, response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", redacted(&self.url)))?;

        tracing::debug!("WebSocket handshake completed: {}", response.status());
        Ok(Box::new(WsConnection { stream }))
    }
}

/// Strip the token before a URL ends up in a log line.
fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn recv(&mut self) -> Option<String> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(text),
                    Err(e) => tracing::warn!("Dropping non-UTF-8 binary frame: {}", e),
                },
                Ok(Message::Close(frame)) => {
                    tracing::info!("Server closed connection: {:?}", frame);
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    return None;
                }
            }
        }
        None
    }

    async fn send(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .context("Failed to send WebSocket message")
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("Error while closing WebSocket: {}", e);
        }
    }
}
