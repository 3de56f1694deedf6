//! Tracing and logging setup shared by the binaries.

/// Tracing subscriber configuration.
pub mod tracing;

pub use self::tracing::{LogFormat, ParseLogFormatError};

/// Initialize process-wide tracing.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat, default_filter: &str) {
    self::tracing::init(format, default_filter);
}
