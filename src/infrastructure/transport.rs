// Event transport seam - how channels obtain their byte stream
use crate::error::TelemetryError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub type ByteStream = BoxStream<'static, Result<Bytes, TelemetryError>>;

/// Source of raw event-stream bytes for one subscription.
///
/// The production implementation speaks HTTP; tests and offline replay use
/// [`ReplayTransport`]. One `connect` call corresponds to one transport-layer
/// resource held for the life of the returned stream.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<ByteStream, TelemetryError>;
}

/// HTTP transport backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpEventTransport {
    client: reqwest::Client,
}

impl HttpEventTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpEventTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventTransport for HttpEventTransport {
    async fn connect(&self, url: &str) -> Result<ByteStream, TelemetryError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TelemetryError::BackendStatus(response.status().as_u16()));
        }

        Ok(response.bytes_stream().map_err(TelemetryError::from).boxed())
    }
}

/// Scripted transport: each queued connection is handed out to the next
/// `connect` call in FIFO order. Used by tests and by offline replay of
/// captured streams.
#[derive(Clone, Default)]
pub struct ReplayTransport {
    pending: Arc<Mutex<VecDeque<mpsc::UnboundedReceiver<Result<Bytes, TelemetryError>>>>>,
}

/// Feeds one scripted connection. Dropping the sender ends the stream, which
/// a channel observes as a normal close.
pub struct ReplaySender {
    tx: mpsc::UnboundedSender<Result<Bytes, TelemetryError>>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one connection and return the handle that feeds it.
    pub fn script_connection(&self) -> ReplaySender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_pending().push_back(rx);
        ReplaySender { tx }
    }

    fn lock_pending(
        &self,
    ) -> MutexGuard<'_, VecDeque<mpsc::UnboundedReceiver<Result<Bytes, TelemetryError>>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EventTransport for ReplayTransport {
    async fn connect(&self, url: &str) -> Result<ByteStream, TelemetryError> {
        let rx = self.lock_pending().pop_front().ok_or_else(|| {
            TelemetryError::ChannelUnavailable(format!("no replay connection scripted for {url}"))
        })?;
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

impl ReplaySender {
    /// Send one named event framed as text/event-stream bytes.
    pub fn send_event(&self, name: &str, data: &str) {
        let frame = format!("event: {name}\ndata: {data}\n\n");
        let _ = self.tx.send(Ok(Bytes::from(frame)));
    }

    /// Send one unnamed (default) event.
    pub fn send_message(&self, data: &str) {
        let frame = format!("data: {data}\n\n");
        let _ = self.tx.send(Ok(Bytes::from(frame)));
    }

    pub fn send_raw(&self, bytes: &[u8]) {
        let _ = self.tx.send(Ok(Bytes::copy_from_slice(bytes)));
    }

    /// Inject a transport-level error, ending the connection.
    pub fn fail(&self, message: &str) {
        let _ = self
            .tx
            .send(Err(TelemetryError::ChannelUnavailable(message.to_string())));
    }
}
