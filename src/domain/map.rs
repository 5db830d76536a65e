// Map view data derived from cluster snapshots

/// One rendered cluster marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub cluster_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Visual diameter in pixels, bounded to a sane range by the projector.
    pub size_px: u32,
    pub color: String,
    pub label: String,
}

/// Axis-aligned geographic bounding region used as the map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingRegion {
    pub fn from_point(lat: f64, lon: f64) -> Self {
        Self {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        }
    }

    /// Grow the region to cover the given point.
    pub fn extend(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}
