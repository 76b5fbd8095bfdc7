//! Chrome DevTools Protocol client
//!
//! Command/response over the page target's WebSocket. One command is in
//! flight at a time; unsolicited event frames are skipped until the
//! response with the matching id arrives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use cartwheel_core::page::{PageError, PageResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Per-command deadline; a page that answers nothing is a dead session.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// DevTools client for one page target
pub struct CdpClient {
    stream: Mutex<Option<WsStream>>,
    next_id: AtomicU64,
}

impl CdpClient {
    /// Create a new client (does not connect)
    pub fn new() -> Self {
        Self {
            stream: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Connect to the page target's WebSocket.
    pub async fn connect(&self, ws_url: &str) -> PageResult<()> {
        let (stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| PageError::Connection(format!("connect to {ws_url}: {e}")))?;
        *self.stream.lock().await = Some(stream);
        debug!("Connected to DevTools target: {}", ws_url);
        Ok(())
    }

    /// Check if connected
    pub async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }

    /// Execute a DevTools method and decode its result.
    pub async fn execute<A: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<A>,
    ) -> PageResult<R> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| PageError::Connection("not connected".to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cmd = CdpCommand {
            id,
            method: method.to_string(),
            params,
        };
        let cmd_str = serde_json::to_string(&cmd)
            .map_err(|e| PageError::Protocol(format!("encode {method}: {e}")))?;
        trace!("CDP command: {}", cmd_str);

        stream
            .send(Message::Text(cmd_str))
            .await
            .map_err(|e| PageError::Connection(e.to_string()))?;

        // Read frames until our response id shows up (skip events)
        let value = tokio::time::timeout(COMMAND_TIMEOUT, async {
            loop {
                let msg = match stream.next().await {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => return Err(PageError::Connection(e.to_string())),
                    None => {
                        return Err(PageError::Connection("devtools socket closed".to_string()))
                    }
                };
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => {
                        return Err(PageError::Connection("devtools socket closed".to_string()))
                    }
                    _ => continue,
                };
                trace!("CDP frame: {}", text);

                let envelope: CdpEnvelope = serde_json::from_str(&text)
                    .map_err(|e| PageError::Protocol(format!("invalid frame: {e}")))?;

                // Event frames carry a method and no id
                if envelope.id != Some(id) {
                    if let Some(event) = envelope.method {
                        trace!("CDP event: {}", event);
                    }
                    continue;
                }

                if let Some(error) = envelope.error {
                    return Err(PageError::Protocol(format!(
                        "{} ({}): {}",
                        method, error.code, error.message
                    )));
                }
                return Ok(envelope.result.unwrap_or(serde_json::Value::Null));
            }
        })
        .await
        .map_err(|_| {
            PageError::Connection(format!("no response to {method} within {COMMAND_TIMEOUT:?}"))
        })??;

        serde_json::from_value(value)
            .map_err(|e| PageError::Protocol(format!("decode {method} result: {e}")))
    }

    /// Execute a method whose result is irrelevant.
    pub async fn execute_void<A: Serialize>(
        &self,
        method: &str,
        params: Option<A>,
    ) -> PageResult<()> {
        let _: serde_json::Value = self.execute(method, params).await?;
        Ok(())
    }

    /// Close the connection
    pub async fn close(&self) {
        let mut guard = self.stream.lock().await;
        if let Some(stream) = guard.as_mut() {
            let _ = stream.close(None).await;
        }
        *guard = None;
    }
}

impl Default for CdpClient {
    fn default() -> Self {
        Self::new()
    }
}

// DevTools protocol envelope
#[derive(Debug, Serialize)]
struct CdpCommand<A> {
    id: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<A>,
}

#[derive(Debug, Deserialize)]
struct CdpEnvelope {
    id: Option<u64>,
    method: Option<String>,
    result: Option<serde_json::Value>,
    error: Option<CdpError>,
}

#[derive(Debug, Deserialize)]
struct CdpError {
    code: i64,
    message: String,
}
