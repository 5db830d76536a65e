// Telemetry client - endpoint construction and stream subscription
use crate::application::streams::{
    CellularStream, ClusterStream, DmMessageStream, GpsStream, SessionLogStream, StreamRecord,
    TelemetryStream, CLUSTER_HISTORY_CAPACITY, MESSAGE_HISTORY_CAPACITY,
};
use crate::infrastructure::config::TelemetryConfig;
use crate::infrastructure::sse::DEFAULT_EVENT_NAME;
use crate::infrastructure::transport::{EventTransport, HttpEventTransport};
use std::sync::Arc;

pub const CELLULAR_EVENT: &str = "cellular-data";
pub const GPS_EVENT: &str = "gps-data";
pub const CLUSTER_EVENT: &str = "cluster-update";

/// Entry point for subscribing to the backend's push channels.
///
/// Holds the backend base URL and the event transport; each `*_stream` call
/// opens one independent subscription. Passing `None` for the device or
/// session id yields a detached stream that holds no connection, so nothing
/// stale is kept open while no device is selected.
#[derive(Clone)]
pub struct TelemetryClient {
    base_url: String,
    transport: Arc<dyn EventTransport>,
}

impl TelemetryClient {
    /// Client speaking HTTP to the given backend base URL,
    /// e.g. `http://localhost:8080/api/adb`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, Arc::new(HttpEventTransport::new()))
    }

    /// Client with a caller-supplied transport (replay, tests).
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn EventTransport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.backend.base_url.clone())
    }

    /// Subscribe to instantaneous cellular samples for a device.
    pub fn cellular_stream(&self, device_id: Option<&str>, interval_secs: u32) -> CellularStream {
        match device_id {
            Some(id) => self.open_stream(
                self.cellular_url(id, interval_secs),
                CELLULAR_EVENT,
                None,
            ),
            None => TelemetryStream::detached(CELLULAR_EVENT, None),
        }
    }

    /// Subscribe to GPS fixes for a device.
    pub fn gps_stream(&self, device_id: Option<&str>, interval_secs: u32) -> GpsStream {
        match device_id {
            Some(id) => self.open_stream(self.gps_url(id, interval_secs), GPS_EVENT, None),
            None => TelemetryStream::detached(GPS_EVENT, None),
        }
    }

    /// Subscribe to cluster snapshots for a device, retaining the last
    /// [`CLUSTER_HISTORY_CAPACITY`] updates.
    pub fn cluster_stream(
        &self,
        device_id: Option<&str>,
        num_clusters: u32,
        interval_secs: u32,
    ) -> ClusterStream {
        match device_id {
            Some(id) => self.open_stream(
                self.cluster_url(id, num_clusters, interval_secs),
                CLUSTER_EVENT,
                Some(CLUSTER_HISTORY_CAPACITY),
            ),
            None => TelemetryStream::detached(CLUSTER_EVENT, Some(CLUSTER_HISTORY_CAPACITY)),
        }
    }

    /// Subscribe to the decoded DM message feed for a capture session.
    pub fn dm_message_stream(&self, session_id: Option<&str>) -> DmMessageStream {
        match session_id {
            Some(id) => self.open_stream(
                format!(
                    "{}/qualcomm/session/{}/dm-messages",
                    self.base_url,
                    urlencoding::encode(id)
                ),
                DEFAULT_EVENT_NAME,
                Some(MESSAGE_HISTORY_CAPACITY),
            ),
            None => TelemetryStream::detached(DEFAULT_EVENT_NAME, Some(MESSAGE_HISTORY_CAPACITY)),
        }
    }

    /// Subscribe to the raw log line feed for a capture session.
    pub fn session_log_stream(&self, session_id: Option<&str>) -> SessionLogStream {
        match session_id {
            Some(id) => self.open_stream(
                format!(
                    "{}/sessions/{}/logs",
                    self.base_url,
                    urlencoding::encode(id)
                ),
                DEFAULT_EVENT_NAME,
                Some(MESSAGE_HISTORY_CAPACITY),
            ),
            None => TelemetryStream::detached(DEFAULT_EVENT_NAME, Some(MESSAGE_HISTORY_CAPACITY)),
        }
    }

    fn open_stream<T: StreamRecord>(
        &self,
        url: String,
        event_name: &str,
        history_capacity: Option<usize>,
    ) -> TelemetryStream<T> {
        TelemetryStream::open(self.transport.clone(), url, event_name, history_capacity)
    }

    fn cellular_url(&self, device_id: &str, interval_secs: u32) -> String {
        format!(
            "{}/devices/{}/stream/cellular?intervalSeconds={}",
            self.base_url,
            urlencoding::encode(device_id),
            interval_secs
        )
    }

    fn gps_url(&self, device_id: &str, interval_secs: u32) -> String {
        format!(
            "{}/devices/{}/stream/gps?intervalSeconds={}",
            self.base_url,
            urlencoding::encode(device_id),
            interval_secs
        )
    }

    fn cluster_url(&self, device_id: &str, num_clusters: u32, interval_secs: u32) -> String {
        format!(
            "{}/devices/{}/stream/clusters?numClusters={}&intervalSeconds={}",
            self.base_url,
            urlencoding::encode(device_id),
            num_clusters,
            interval_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_urls_follow_the_backend_patterns() {
        let client = TelemetryClient::new("http://localhost:8080/api/adb/");

        assert_eq!(
            client.cellular_url("emulator-5554", 1),
            "http://localhost:8080/api/adb/devices/emulator-5554/stream/cellular?intervalSeconds=1"
        );
        assert_eq!(
            client.gps_url("emulator-5554", 2),
            "http://localhost:8080/api/adb/devices/emulator-5554/stream/gps?intervalSeconds=2"
        );
        assert_eq!(
            client.cluster_url("emulator-5554", 4, 3),
            "http://localhost:8080/api/adb/devices/emulator-5554/stream/clusters?numClusters=4&intervalSeconds=3"
        );
    }

    #[test]
    fn device_ids_are_url_encoded() {
        let client = TelemetryClient::new("http://localhost:8080/api/adb");

        assert_eq!(
            client.gps_url("usb device 1", 1),
            "http://localhost:8080/api/adb/devices/usb%20device%201/stream/gps?intervalSeconds=1"
        );
    }

    #[tokio::test]
    async fn none_ids_yield_detached_streams() {
        let client = TelemetryClient::new("http://localhost:8080/api/adb");

        let cellular = client.cellular_stream(None, 1);
        let dm = client.dm_message_stream(None);

        assert!(!cellular.connected());
        assert!(cellular.latest().is_none());
        assert!(!dm.connected());
        assert!(dm.history().is_empty());
    }
}
