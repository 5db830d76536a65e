//! Client-side live-telemetry core for a cellular drive-test dashboard.
//!
//! The crate subscribes to the measurement backend's SSE push channels
//! (cellular samples, GPS fixes, geographic cluster snapshots, raw log and
//! DM message feeds), keeps bounded in-memory state per channel, owns the
//! device/session registry, and derives map-marker state from the newest
//! cluster snapshot. Rendering and REST CRUD calls live in the presentation
//! layer on top of this crate.

pub mod application;
pub mod client;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use client::TelemetryClient;
pub use error::TelemetryError;
