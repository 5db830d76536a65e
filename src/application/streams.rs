// Typed telemetry streams - bounded live state fed by one push channel each
use crate::application::history::BoundedHistory;
use crate::domain::cluster::ClusterUpdate;
use crate::domain::telemetry::{CellularSample, DmMessage, GpsFix, LogEntry};
use crate::error::TelemetryError;
use crate::infrastructure::channel::{ChannelState, RecordSink, StreamChannel};
use crate::infrastructure::sse::SseEvent;
use crate::infrastructure::transport::EventTransport;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Cluster updates retained per stream for trend views.
pub const CLUSTER_HISTORY_CAPACITY: usize = 50;
/// Raw log/DM messages retained per stream for scrolling viewers.
pub const MESSAGE_HISTORY_CAPACITY: usize = 1000;

/// A record type carried by one push channel.
pub trait StreamRecord: Clone + Send + 'static {
    fn parse(event: &str, data: &str) -> Result<Self, TelemetryError>;
}

fn parse_json<T: DeserializeOwned>(event: &str, data: &str) -> Result<T, TelemetryError> {
    serde_json::from_str(data).map_err(|source| TelemetryError::Parse {
        event: event.to_string(),
        source,
    })
}

impl StreamRecord for CellularSample {
    fn parse(event: &str, data: &str) -> Result<Self, TelemetryError> {
        parse_json(event, data)
    }
}

impl StreamRecord for GpsFix {
    fn parse(event: &str, data: &str) -> Result<Self, TelemetryError> {
        parse_json(event, data)
    }
}

impl StreamRecord for ClusterUpdate {
    fn parse(event: &str, data: &str) -> Result<Self, TelemetryError> {
        parse_json(event, data)
    }
}

impl StreamRecord for DmMessage {
    fn parse(event: &str, data: &str) -> Result<Self, TelemetryError> {
        parse_json(event, data)
    }
}

impl StreamRecord for LogEntry {
    // Log lines are free-form text; anything that arrives is a valid entry.
    fn parse(_event: &str, data: &str) -> Result<Self, TelemetryError> {
        Ok(LogEntry {
            received_at: chrono::Utc::now(),
            line: data.to_string(),
        })
    }
}

struct StreamInner<T> {
    latest: Option<T>,
    history: Option<BoundedHistory<T>>,
    parse_errors: u64,
    revision: u64,
    closed: bool,
}

pub(crate) struct StreamShared<T> {
    event_name: String,
    inner: Mutex<StreamInner<T>>,
    connected_tx: watch::Sender<bool>,
    updates_tx: watch::Sender<u64>,
}

impl<T: StreamRecord> StreamShared<T> {
    fn new(event_name: &str, history_capacity: Option<usize>) -> Self {
        let (connected_tx, _) = watch::channel(false);
        let (updates_tx, _) = watch::channel(0);
        Self {
            event_name: event_name.to_string(),
            inner: Mutex::new(StreamInner {
                latest: None,
                history: history_capacity.map(BoundedHistory::new),
                parse_errors: 0,
                revision: 0,
                closed: false,
            }),
            connected_tx,
            updates_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StreamInner<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: StreamRecord> RecordSink for StreamShared<T> {
    fn on_record(&self, event: &SseEvent) {
        match T::parse(&self.event_name, &event.data) {
            Ok(record) => {
                let mut inner = self.lock();
                if inner.closed {
                    return;
                }
                if let Some(history) = inner.history.as_mut() {
                    history.push(record.clone());
                }
                // Last-write-wins: arrival order is trusted as temporal
                // order, no out-of-order correction.
                inner.latest = Some(record);
                inner.revision += 1;
                let _ = self.updates_tx.send(inner.revision);
            }
            Err(e) => {
                let mut inner = self.lock();
                if inner.closed {
                    return;
                }
                inner.parse_errors += 1;
                tracing::warn!(event = %self.event_name, error = %e, "dropping malformed record");
            }
        }
    }

    fn on_state(&self, state: ChannelState) {
        // The lock is held across the send: a concurrent close must either
        // run before this (then `closed` is seen) or after (then it sends the
        // final false), so a stale connected flag can never outlive teardown.
        let inner = self.lock();
        if inner.closed {
            return;
        }
        let _ = self.connected_tx.send(state == ChannelState::Open);
    }
}

/// Live state for one device stream: the newest record, a connectivity flag,
/// and (where configured) a bounded history.
///
/// Subscribing with no device yields a detached stream that holds no channel
/// and reports empty, disconnected state. Dropping the stream (or calling
/// [`unsubscribe`](Self::unsubscribe)) closes the channel synchronously; no
/// record arriving afterwards can mutate this state.
pub struct TelemetryStream<T: StreamRecord> {
    shared: Arc<StreamShared<T>>,
    channel: Option<StreamChannel>,
}

impl<T: StreamRecord> TelemetryStream<T> {
    pub(crate) fn open(
        transport: Arc<dyn EventTransport>,
        url: String,
        event_name: &str,
        history_capacity: Option<usize>,
    ) -> Self {
        let shared = Arc::new(StreamShared::new(event_name, history_capacity));
        let channel =
            StreamChannel::open(transport, url, event_name.to_string(), shared.clone());
        Self {
            shared,
            channel: Some(channel),
        }
    }

    pub(crate) fn detached(event_name: &str, history_capacity: Option<usize>) -> Self {
        Self {
            shared: Arc::new(StreamShared::new(event_name, history_capacity)),
            channel: None,
        }
    }

    /// Newest record, last-write-wins.
    pub fn latest(&self) -> Option<T> {
        self.shared.lock().latest.clone()
    }

    /// True iff the channel's most recent lifecycle transition was Open.
    pub fn connected(&self) -> bool {
        *self.shared.connected_tx.borrow()
    }

    /// Watch connectivity transitions.
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.shared.connected_tx.subscribe()
    }

    /// Watch the record revision counter; bumps once per applied record.
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.shared.updates_tx.subscribe()
    }

    /// Retained records oldest to newest. Empty when the stream keeps no
    /// history.
    pub fn history(&self) -> Vec<T> {
        self.shared
            .lock()
            .history
            .as_ref()
            .map(BoundedHistory::to_vec)
            .unwrap_or_default()
    }

    /// Count of malformed records skipped so far.
    pub fn parse_errors(&self) -> u64 {
        self.shared.lock().parse_errors
    }

    /// Close the channel. Equivalent to dropping the stream, but explicit.
    pub fn unsubscribe(mut self) {
        self.close_now();
    }

    fn close_now(&mut self) {
        {
            let mut inner = self.shared.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            let _ = self.shared.connected_tx.send(false);
        }
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}

impl<T: StreamRecord> Drop for TelemetryStream<T> {
    fn drop(&mut self) {
        self.close_now();
    }
}

/// Instantaneous cellular samples (`cellular-data` events).
pub type CellularStream = TelemetryStream<CellularSample>;
/// GPS fixes (`gps-data` events).
pub type GpsStream = TelemetryStream<GpsFix>;
/// Cluster snapshots (`cluster-update` events), with bounded history.
pub type ClusterStream = TelemetryStream<ClusterUpdate>;
/// Decoded Qualcomm DM messages from the per-session feed.
pub type DmMessageStream = TelemetryStream<DmMessage>;
/// Raw per-session log lines.
pub type SessionLogStream = TelemetryStream<LogEntry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::transport::ReplayTransport;
    use std::time::Duration;
    use tokio::time::timeout;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("drivetest_telemetry=debug")
            .try_init();
    }

    fn gps_json(lat: f64, lon: f64) -> String {
        format!(
            "{{\"latitude\":{lat},\"longitude\":{lon},\"altitude\":10.0,\"accuracy\":3.5,\"timestamp\":1700000000000}}"
        )
    }

    fn open_gps(transport: &ReplayTransport) -> GpsStream {
        TelemetryStream::open(
            Arc::new(transport.clone()),
            "http://backend/devices/a/stream/gps?intervalSeconds=1".to_string(),
            "gps-data",
            None,
        )
    }

    async fn wait_for_revision(stream: &TelemetryStream<impl StreamRecord>, revision: u64) {
        let mut rx = stream.updates();
        timeout(Duration::from_secs(5), rx.wait_for(|r| *r >= revision))
            .await
            .expect("timed out waiting for records")
            .expect("updates channel dropped");
    }

    async fn wait_for_connected(stream: &TelemetryStream<impl StreamRecord>, connected: bool) {
        let mut rx = stream.connectivity();
        timeout(Duration::from_secs(5), rx.wait_for(|c| *c == connected))
            .await
            .expect("timed out waiting for connectivity")
            .expect("connectivity channel dropped");
    }

    #[tokio::test]
    async fn latest_is_last_write_wins() {
        init_tracing();
        let transport = ReplayTransport::new();
        let feed = transport.script_connection();
        let stream = open_gps(&transport);

        wait_for_connected(&stream, true).await;
        feed.send_event("gps-data", &gps_json(1.0, 1.0));
        feed.send_event("gps-data", &gps_json(2.0, 2.0));
        wait_for_revision(&stream, 2).await;

        let latest = stream.latest().unwrap();
        assert_eq!(latest.latitude, 2.0);
        assert!(stream.connected());
    }

    #[tokio::test]
    async fn malformed_payload_is_skipped_and_channel_stays_open() {
        let transport = ReplayTransport::new();
        let feed = transport.script_connection();
        let stream = open_gps(&transport);

        wait_for_connected(&stream, true).await;
        feed.send_event("gps-data", "not json at all");
        feed.send_event("gps-data", &gps_json(3.0, 4.0));
        wait_for_revision(&stream, 1).await;

        assert_eq!(stream.parse_errors(), 1);
        assert_eq!(stream.latest().unwrap().longitude, 4.0);
        assert!(stream.connected());
    }

    #[tokio::test]
    async fn transport_error_flips_connected_off() {
        let transport = ReplayTransport::new();
        let feed = transport.script_connection();
        let stream = open_gps(&transport);

        wait_for_connected(&stream, true).await;
        feed.fail("backend went away");
        wait_for_connected(&stream, false).await;

        assert!(!stream.connected());
    }

    #[tokio::test]
    async fn unsubscribed_stream_ignores_late_records() {
        let transport = ReplayTransport::new();
        let feed = transport.script_connection();
        let stream = open_gps(&transport);
        wait_for_connected(&stream, true).await;

        let shared = stream.shared.clone();
        stream.unsubscribe();
        drop(feed);

        // Emulate records and lifecycle callbacks arriving after teardown.
        shared.on_record(&SseEvent {
            name: "gps-data".to_string(),
            data: gps_json(9.0, 9.0),
            id: None,
        });
        shared.on_state(ChannelState::Open);

        let inner = shared.lock();
        assert!(inner.latest.is_none());
        assert_eq!(inner.revision, 0);
        drop(inner);
        assert!(!*shared.connected_tx.borrow());
    }

    #[tokio::test]
    async fn detached_stream_reports_empty_disconnected_state() {
        let stream = GpsStream::detached("gps-data", None);

        assert!(stream.latest().is_none());
        assert!(!stream.connected());
        assert!(stream.history().is_empty());
    }

    #[tokio::test]
    async fn history_keeps_newest_records_up_to_capacity() {
        let transport = ReplayTransport::new();
        let feed = transport.script_connection();
        let stream: GpsStream = TelemetryStream::open(
            Arc::new(transport.clone()),
            "http://backend/devices/a/stream/gps?intervalSeconds=1".to_string(),
            "gps-data",
            Some(3),
        );

        wait_for_connected(&stream, true).await;
        for i in 0..5 {
            feed.send_event("gps-data", &gps_json(i as f64, 0.0));
        }
        wait_for_revision(&stream, 5).await;

        let history = stream.history();
        let lats: Vec<f64> = history.iter().map(|f| f.latitude).collect();
        assert_eq!(lats, vec![2.0, 3.0, 4.0]);
        assert_eq!(stream.latest().unwrap().latitude, 4.0);
    }

    #[tokio::test]
    async fn log_stream_accepts_free_form_lines() {
        let transport = ReplayTransport::new();
        let feed = transport.script_connection();
        let stream: SessionLogStream = TelemetryStream::open(
            Arc::new(transport.clone()),
            "http://backend/sessions/12/logs".to_string(),
            "message",
            Some(MESSAGE_HISTORY_CAPACITY),
        );

        wait_for_connected(&stream, true).await;
        feed.send_message("RRC Connection Request");
        wait_for_revision(&stream, 1).await;

        assert_eq!(stream.latest().unwrap().line, "RRC Connection Request");
        assert_eq!(stream.history().len(), 1);
    }
}
