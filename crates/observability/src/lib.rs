//! Tracing/logging setup shared by every binary.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, ParseLogFormatError, TracingConfig};

/// Initialize process-wide tracing with defaults (`RUST_LOG`, else `info`; JSON).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&TracingConfig::default());
}

/// Initialize process-wide tracing from explicit settings.
pub fn init_with(config: &TracingConfig) {
    tracing::init(config);
}
