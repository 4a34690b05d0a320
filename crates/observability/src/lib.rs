//! Tracing and logging setup shared by binaries and tests.

/// Subscriber installation (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, ParseLogFormatError};

/// Install the process-wide subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(format: LogFormat) {
    crate::tracing::init(format);
}
