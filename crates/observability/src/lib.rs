//! Process-wide logging setup shared by the binaries.

/// Initialize tracing for the process from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filter, output format).
pub mod tracing;

pub use self::tracing::LogFormat;
