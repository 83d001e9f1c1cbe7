//! Observability wiring for the workspace.

pub mod tracing;

pub use tracing::init;
