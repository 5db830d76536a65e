// StreamChannel - lifecycle of one outbound push subscription
use crate::error::TelemetryError;
use crate::infrastructure::sse::{SseEvent, SseParser};
use crate::infrastructure::transport::EventTransport;
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle state of one push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Error,
    Closed,
}

/// Receives channel output. Implementations must tolerate being called from
/// the channel's reader task and must be cheap; there is no await point
/// between a record arriving and the sink observing it, so records are
/// applied fully and in arrival order.
pub(crate) trait RecordSink: Send + Sync {
    /// One inbound record whose event name matched the subscription.
    fn on_record(&self, event: &SseEvent);
    /// A lifecycle transition observed on the transport (Open, Error, or a
    /// server-side Closed). Manual `close` does not call this; callers that
    /// close a channel already know.
    fn on_state(&self, state: ChannelState);
}

struct ChannelShared {
    state_tx: watch::Sender<ChannelState>,
    closed: Mutex<bool>,
    sink: Arc<dyn RecordSink>,
}

impl ChannelShared {
    // The closed lock is held across every send and sink call so that output
    // is serialized against `close`: once `close` has taken the lock and set
    // the flag, no later transition or record can slip through behind it.
    fn publish(&self, state: ChannelState) {
        let closed = self.lock_closed();
        if *closed {
            return;
        }
        let _ = self.state_tx.send(state);
        self.sink.on_state(state);
    }

    fn deliver(&self, event: &SseEvent) {
        let closed = self.lock_closed();
        if *closed {
            return;
        }
        self.sink.on_record(event);
    }

    fn lock_closed(&self) -> MutexGuard<'_, bool> {
        self.closed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One open subscription to a backend push channel.
///
/// Holds exactly one transport-layer resource while open. Closing (or
/// dropping) releases it; `close` is idempotent and after it returns no sink
/// callback can observe further output from this channel.
pub struct StreamChannel {
    shared: Arc<ChannelShared>,
    task: JoinHandle<()>,
}

impl StreamChannel {
    pub(crate) fn open(
        transport: Arc<dyn EventTransport>,
        url: String,
        event_name: String,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Connecting);
        let shared = Arc::new(ChannelShared {
            state_tx,
            closed: Mutex::new(false),
            sink,
        });

        let task = tokio::spawn(run_channel(transport, url, event_name, shared.clone()));
        Self { shared, task }
    }

    pub fn state(&self) -> ChannelState {
        *self.shared.state_tx.borrow()
    }

    /// True iff the most recent lifecycle transition was Open.
    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.shared.state_tx.subscribe()
    }

    /// Close the channel and release its transport resource. Idempotent.
    ///
    /// Taking the closed lock waits out any callback already in flight on the
    /// reader task; after `close` returns, no callback fires again.
    pub fn close(&self) {
        let mut closed = self.shared.lock_closed();
        if *closed {
            return;
        }
        *closed = true;
        self.task.abort();
        let _ = self.shared.state_tx.send(ChannelState::Closed);
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_channel(
    transport: Arc<dyn EventTransport>,
    url: String,
    event_name: String,
    shared: Arc<ChannelShared>,
) {
    let mut stream = match transport.connect(&url).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "stream connect failed");
            shared.publish(ChannelState::Error);
            return;
        }
    };

    tracing::debug!(url = %url, event = %event_name, "stream open");
    shared.publish(ChannelState::Open);

    let mut parser = SseParser::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(bytes) => {
                for event in parser.feed(&bytes) {
                    if event.name == event_name {
                        shared.deliver(&event);
                    } else {
                        tracing::debug!(url = %url, event = %event.name, "ignoring unexpected event");
                    }
                }
            }
            Err(e) => {
                report_transport_error(&url, &e);
                shared.publish(ChannelState::Error);
                return;
            }
        }
    }

    tracing::debug!(url = %url, "stream ended by server");
    shared.publish(ChannelState::Closed);
}

fn report_transport_error(url: &str, error: &TelemetryError) {
    tracing::warn!(url = %url, error = %error, "stream transport error; channel disconnected");
}
