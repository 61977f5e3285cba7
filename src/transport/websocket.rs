//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::{connect_async, tungstenite::{self, Message}};
use url::Url;

use super::{Connect, Connection, Frame};
use crate::error::ConnectionError;

/// Default [`Connect`] implementation: TLS-capable WebSocket client.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connect for WebSocketConnector {
    async fn connect(&self, url: &Url) -> Result<Connection, ConnectionError> {
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(ConnectionError::connect)?;
        let (sink, stream) = socket.split();

        let sink = sink
            .with(|text: String| future::ready(Ok::<_, tungstenite::Error>(Message::Text(text))))
            .sink_map_err(ConnectionError::closed);

        let stream = stream.filter_map(|item| {
            future::ready(match item {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text))),
                Ok(Message::Binary(bytes)) => Some(Ok(Frame::Binary(bytes))),
                Ok(Message::Close(frame)) => {
                    let cause = match frame {
                        Some(f) => format!("remote close {}: {}", f.code, f.reason),
                        None => "remote close".to_string(),
                    };
                    Some(Err(ConnectionError::closed(cause)))
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
                Err(e) => Some(Err(ConnectionError::closed(e))),
            })
        });

        Ok(Connection {
            sink: Box::pin(sink),
            stream: stream.boxed(),
        })
    }
}
