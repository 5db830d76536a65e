// Infrastructure layer - Transport, wire parsing, and configuration
pub mod channel;
pub mod config;
pub mod sse;
pub mod transport;
