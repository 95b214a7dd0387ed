//! assessor-sources: Question sources, telemetry sinks and configuration.
//!
//! Implements the `QuestionSource` trait for TOML question banks and remote
//! question services, and the `TelemetrySink` trait for JSONL files and
//! tracing output.

pub mod bank;
pub mod config;
pub mod http;
pub mod telemetry;

pub use bank::BankSource;
pub use config::{
    create_source, create_telemetry, load_config, load_config_from, AssessorConfig, SourceConfig,
    TelemetryConfig,
};
pub use http::HttpSource;
pub use telemetry::{JsonlSink, TracingSink};
