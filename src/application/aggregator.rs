// Telemetry aggregator - one consistent view over the three device streams
use crate::application::streams::{CellularStream, ClusterStream, GpsStream};
use crate::client::TelemetryClient;
use crate::domain::cluster::ClusterUpdate;
use crate::domain::telemetry::{CellularSample, GpsFix};
use crate::infrastructure::config::StreamSettings;

/// Per-subscription tuning passed to the backend as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub cellular_interval_secs: u32,
    pub gps_interval_secs: u32,
    pub cluster_interval_secs: u32,
    pub num_clusters: u32,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            cellular_interval_secs: 1,
            gps_interval_secs: 1,
            cluster_interval_secs: 3,
            num_clusters: 4,
        }
    }
}

impl From<&StreamSettings> for StreamOptions {
    fn from(settings: &StreamSettings) -> Self {
        Self {
            cellular_interval_secs: settings.cellular_interval_secs,
            gps_interval_secs: settings.gps_interval_secs,
            cluster_interval_secs: settings.cluster_interval_secs,
            num_clusters: settings.num_clusters,
        }
    }
}

/// Point-in-time view of everything known about the selected device.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveTestView {
    pub cellular: Option<CellularSample>,
    pub gps: Option<GpsFix>,
    pub clusters: Option<ClusterUpdate>,
    pub cluster_history: Vec<ClusterUpdate>,
    /// True when any of the three channels is live; the channels degrade
    /// independently, so one failure does not mark the device unreachable.
    pub connected: bool,
}

/// Composes the cellular, GPS and cluster streams for one device.
///
/// The three streams are fully independent: no failure in one blocks or
/// resets the others, and there is no cross-channel ordering guarantee, which
/// is why the view keeps separate "latest" slots instead of aligning
/// timestamps. Dropping the aggregator tears all three streams down.
pub struct TelemetryAggregator {
    cellular: CellularStream,
    gps: GpsStream,
    clusters: ClusterStream,
}

impl TelemetryAggregator {
    /// Open all three streams for the device. `device_id = None` opens
    /// detached streams, holding no connection while nothing is selected.
    pub fn open(client: &TelemetryClient, device_id: Option<&str>, options: StreamOptions) -> Self {
        Self {
            cellular: client.cellular_stream(device_id, options.cellular_interval_secs),
            gps: client.gps_stream(device_id, options.gps_interval_secs),
            clusters: client.cluster_stream(
                device_id,
                options.num_clusters,
                options.cluster_interval_secs,
            ),
        }
    }

    /// Tear down the current streams and reopen for a (possibly different)
    /// device or parameter set.
    pub fn resubscribe(
        &mut self,
        client: &TelemetryClient,
        device_id: Option<&str>,
        options: StreamOptions,
    ) {
        *self = Self::open(client, device_id, options);
    }

    pub fn connected(&self) -> bool {
        self.cellular.connected() || self.gps.connected() || self.clusters.connected()
    }

    pub fn snapshot(&self) -> DriveTestView {
        DriveTestView {
            cellular: self.cellular.latest(),
            gps: self.gps.latest(),
            clusters: self.clusters.latest(),
            cluster_history: self.clusters.history(),
            connected: self.connected(),
        }
    }

    pub fn cellular(&self) -> &CellularStream {
        &self.cellular
    }

    pub fn gps(&self) -> &GpsStream {
        &self.gps
    }

    pub fn clusters(&self) -> &ClusterStream {
        &self.clusters
    }
}
