// Application layer - Streams, registry, aggregation, and map projection
pub mod aggregator;
pub mod history;
pub mod projector;
pub mod registry;
pub mod streams;
