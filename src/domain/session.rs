// Device/session domain model

/// Per-device session state tracked by the registry.
///
/// Created the first time a device id is registered. `session_id` is set only
/// by an explicit session start and survives a stop for audit purposes; the
/// entry itself survives transient disconnections and is removed only
/// explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSession {
    pub device_id: String,
    pub session_id: Option<i64>,
    pub is_capturing: bool,
    pub model: String,
    pub manufacturer: String,
}

impl DeviceSession {
    pub fn new(device_id: String, model: String, manufacturer: String) -> Self {
        Self {
            device_id,
            session_id: None,
            is_capturing: false,
            model,
            manufacturer,
        }
    }
}
