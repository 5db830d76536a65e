// Cluster map projection - markers and viewport from the newest snapshot
use crate::domain::cluster::ClusterUpdate;
use crate::domain::map::{BoundingRegion, MapMarker};

/// Marker diameter bounds in pixels.
const MIN_MARKER_PX: u32 = 20;
const MAX_MARKER_PX: u32 = 60;

/// Derives the map marker set and viewport from the latest cluster update.
///
/// Every update fully replaces the previous marker set: cluster ids are not
/// stable across clustering runs, so there is nothing sound to diff against.
/// An update with zero zones clears the markers but keeps the previous
/// viewport.
#[derive(Debug, Default)]
pub struct ClusterMapProjector {
    markers: Vec<MapMarker>,
    viewport: Option<BoundingRegion>,
}

impl ClusterMapProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: &ClusterUpdate) {
        self.markers = update
            .zones
            .iter()
            .map(|zone| MapMarker {
                cluster_id: zone.cluster_id,
                latitude: zone.center_lat,
                longitude: zone.center_lon,
                size_px: marker_size(zone.point_count),
                color: zone.color.clone(),
                label: format!("{} ({})", zone.quality, zone.point_count),
            })
            .collect();

        if let Some(first) = update.zones.first() {
            let mut region = BoundingRegion::from_point(first.center_lat, first.center_lon);
            for zone in &update.zones[1..] {
                region.extend(zone.center_lat, zone.center_lon);
            }
            self.viewport = Some(region);
        }
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    pub fn viewport(&self) -> Option<BoundingRegion> {
        self.viewport
    }
}

/// Linear point-count-to-size mapping bounded to a sane pixel range.
fn marker_size(point_count: u32) -> u32 {
    point_count
        .saturating_mul(2)
        .clamp(MIN_MARKER_PX, MAX_MARKER_PX)
}
