//! The duplex event channel to the discovery backend: commands go out as
//! JSON POSTs, events come back as a long-polled NDJSON stream.

use std::sync::mpsc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use futures_util::StreamExt;
use scout_logging::{scout_debug, scout_warn};
use tokio_util::sync::CancellationToken;

use crate::types::{BackendEvent, BridgeError, ClientCommand, EngineEvent};

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Base URL of the backend bridge, e.g. `http://127.0.0.1:8787`.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Timeout for one command POST.
    pub command_timeout: Duration,
    /// Delay before reconnecting a dropped event stream.
    pub reconnect_delay: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Receiving side of the event channel.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BackendEvent);
}

/// Sink that forwards backend events onto the engine's event channel.
pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: BackendEvent) {
        let _ = self.tx.send(EngineEvent::Backend(event));
    }
}

/// Abstract duplex messaging with the backend. `send` delivers one command;
/// `poll_events` runs one long-poll cycle, emitting every event it parses.
#[async_trait::async_trait]
pub trait Bridge: Send + Sync {
    async fn send(&self, command: ClientCommand) -> Result<(), BridgeError>;
    async fn poll_events(&self, sink: &dyn EventSink) -> Result<(), BridgeError>;
}

pub struct HttpBridge {
    settings: BridgeSettings,
    command_client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpBridge {
    pub fn new(settings: BridgeSettings) -> Result<Self, BridgeError> {
        let command_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.command_timeout)
            .build()
            .map_err(|err| BridgeError::Network(err.to_string()))?;
        // The event stream stays open indefinitely; only bound the connect.
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| BridgeError::Network(err.to_string()))?;
        Ok(Self {
            settings,
            command_client,
            stream_client,
        })
    }

    fn commands_url(&self) -> String {
        format!("{}/commands", self.settings.base_url.trim_end_matches('/'))
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl Bridge for HttpBridge {
    async fn send(&self, command: ClientCommand) -> Result<(), BridgeError> {
        let response = self
            .command_client
            .post(self.commands_url())
            .json(&command)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    async fn poll_events(&self, sink: &dyn EventSink) -> Result<(), BridgeError> {
        let response = self
            .stream_client
            .get(self.events_url())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::HttpStatus(status.as_u16()));
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line = buffer.split_to(pos + 1);
                emit_line(&line[..line.len() - 1], sink);
            }
        }
        // The stream may end without a trailing newline.
        if !buffer.is_empty() {
            let line = buffer.copy_to_bytes(buffer.len());
            emit_line(&line, sink);
        }
        Ok(())
    }
}

fn emit_line(line: &[u8], sink: &dyn EventSink) {
    let trimmed = line.strip_suffix(b"\r").unwrap_or(line);
    if trimmed.iter().all(u8::is_ascii_whitespace) {
        return;
    }
    match serde_json::from_slice::<BackendEvent>(trimmed) {
        Ok(event) => sink.emit(event),
        // A malformed line never kills the stream.
        Err(err) => scout_warn!("skipping malformed event line: {}", err),
    }
}

/// Re-poll the event channel until cancelled, backing off after failures
/// and dropped streams.
pub async fn run_event_pump(
    bridge: std::sync::Arc<dyn Bridge>,
    sink: std::sync::Arc<dyn EventSink>,
    cancel: CancellationToken,
    reconnect_delay: Duration,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            result = bridge.poll_events(sink.as_ref()) => {
                match result {
                    Ok(()) => scout_debug!("event stream ended, reconnecting"),
                    Err(err) => scout_warn!("event channel error: {}", err),
                }
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BridgeError {
    if err.is_timeout() {
        return BridgeError::Timeout;
    }
    if err.is_builder() {
        return BridgeError::InvalidUrl(err.to_string());
    }
    BridgeError::Network(err.to_string())
}
