// Error taxonomy for the telemetry core
use thiserror::Error;

/// Failures surfaced by the streaming layer.
///
/// Nothing here is fatal to the surrounding process: transport errors degrade
/// the affected channel to a disconnected state, parse errors skip the record.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    BackendStatus(u16),

    #[error("channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("malformed {event} payload: {source}")]
    Parse {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}
