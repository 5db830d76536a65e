// Instantaneous telemetry records pushed by the backend
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One cellular measurement sample. Immutable once received; only the newest
/// sample per device is kept as "current".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellularSample {
    pub rsrp: f64,
    pub rsrq: f64,
    pub sinr: f64,
    pub rssi: f64,
    pub cqi: i32,
    pub cell_id: String,
    pub pci: i32,
    pub tac: i32,
    pub mcc: String,
    pub mnc: String,
    pub operator: String,
    pub network_type: String,
    /// Capture time, epoch milliseconds as sent by the backend.
    pub timestamp: i64,
}

/// One GPS fix. Same retention policy as [`CellularSample`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
    pub timestamp: i64,
}

/// One decoded Qualcomm DM message from the per-session message feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DmMessage {
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub message_type: String,
    pub message: String,
    pub hex: String,
}

/// One raw line from the per-session log feed, stamped on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub received_at: DateTime<Utc>,
    pub line: String,
}
