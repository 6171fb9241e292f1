//! Feature-gated logging macros used throughout the crate.
//!
//! With the `logging` feature the macros forward to `tracing`; without it
//! they expand to nothing, so argument expressions are never evaluated.
//! Keep expensive formatting inside the macro arguments.
//!
//! ```rust,ignore
//! use crate::logging::{debug, warn};
//!
//! debug!(slug = %slug, attempt, "probing slug mapping");
//! warn!(path = %path, error = %err, "write not acknowledged");
//! ```

/// Per-record decisions inside aggregation loops.
#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => { () };
}

/// Probe attempts, commits and other per-operation detail.
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => { () };
}

/// Resolutions, saves and store lifecycle.
#[cfg(feature = "logging")]
macro_rules! log_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_info {
    ($($arg:tt)*) => { () };
}

/// Unacknowledged writes, store errors swallowed as latency, timeouts.
#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => { () };
}

pub(crate) use log_debug as debug;
pub(crate) use log_info as info;
pub(crate) use log_trace as trace;
pub(crate) use log_warn as warn;
