// Configuration loading for the telemetry client
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub backend: BackendSettings,
    #[serde(default)]
    pub streams: StreamSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the measurement backend, e.g. `http://localhost:8080/api/adb`.
    pub base_url: String,
}

/// Per-subscription defaults. The intervals are hints the backend uses to
/// throttle its push rate; the client renders whatever arrives.
#[derive(Debug, Deserialize, Clone)]
pub struct StreamSettings {
    #[serde(default = "default_cellular_interval")]
    pub cellular_interval_secs: u32,
    #[serde(default = "default_gps_interval")]
    pub gps_interval_secs: u32,
    #[serde(default = "default_cluster_interval")]
    pub cluster_interval_secs: u32,
    #[serde(default = "default_num_clusters")]
    pub num_clusters: u32,
}

fn default_cellular_interval() -> u32 {
    1
}

fn default_gps_interval() -> u32 {
    1
}

fn default_cluster_interval() -> u32 {
    3
}

fn default_num_clusters() -> u32 {
    4
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            cellular_interval_secs: default_cellular_interval(),
            gps_interval_secs: default_gps_interval(),
            cluster_interval_secs: default_cluster_interval(),
            num_clusters: default_num_clusters(),
        }
    }
}

pub fn load_telemetry_config() -> anyhow::Result<TelemetryConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/telemetry"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_settings_default_to_drive_test_intervals() {
        let settings = StreamSettings::default();

        assert_eq!(settings.cellular_interval_secs, 1);
        assert_eq!(settings.gps_interval_secs, 1);
        assert_eq!(settings.cluster_interval_secs, 3);
        assert_eq!(settings.num_clusters, 4);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "backend = { base_url = \"http://localhost:8080/api/adb\" }\nstreams = { cluster_interval_secs = 5 }",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let parsed: TelemetryConfig = settings.try_deserialize().unwrap();

        assert_eq!(parsed.backend.base_url, "http://localhost:8080/api/adb");
        assert_eq!(parsed.streams.cluster_interval_secs, 5);
        assert_eq!(parsed.streams.num_clusters, 4);
    }
}
