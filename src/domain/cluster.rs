// Geographic signal-quality cluster snapshots
use serde::Deserialize;

/// One measurement point assigned to a cluster by the backend's clustering
/// run. Carried inside zones for drill-down views; the core never recomputes
/// cluster membership.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub rsrp: f64,
    pub rsrq: f64,
    pub sinr: f64,
    pub cqi: i32,
    pub cell_id: String,
    pub pci: i32,
    #[serde(default)]
    pub cluster_id: Option<i64>,
    pub timestamp: i64,
}

/// One geographic cluster of similar signal quality.
///
/// The quality label and render color are chosen upstream by quality bucket;
/// this layer consumes them as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterZone {
    pub cluster_id: i64,
    pub quality: String,
    pub color: String,
    pub avg_rsrp: f64,
    pub avg_rsrq: f64,
    pub avg_sinr: f64,
    pub point_count: u32,
    pub center_lat: f64,
    pub center_lon: f64,
    #[serde(default)]
    pub points: Vec<MeasurementPoint>,
}

/// One complete clustering snapshot. Cluster ids are unique within one update
/// but NOT stable across updates; a later clustering run may renumber or
/// merge zones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterUpdate {
    pub update_id: String,
    pub session_id: String,
    pub timestamp: i64,
    pub zones: Vec<ClusterZone>,
    pub total_points: u32,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
