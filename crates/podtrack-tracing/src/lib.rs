//! Tracing setup shared by podtrack binaries: fmt logging plus optional OTLP export.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{OtlpProtocol, TracingConfig};
pub use otlp::{init_tracing, TracingGuard};
