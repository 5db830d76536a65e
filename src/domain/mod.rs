// Domain layer - Wire records and derived view data
pub mod cluster;
pub mod map;
pub mod session;
pub mod telemetry;
