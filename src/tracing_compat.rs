//! Optional tracing integration.
//!
//! Library code logs through this module instead of naming `tracing`
//! directly. With the `tracing-integration` feature enabled the macros are
//! `tracing`'s own; without it they expand to nothing, so disabled logging
//! costs nothing at runtime.
//!
//! ```ignore
//! use crate::tracing_compat::debug;
//!
//! debug!(demand = n, "rejected non-positive request");
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __backflow_trace_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing-integration"))]
pub use crate::__backflow_trace_noop as debug;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__backflow_trace_noop as trace;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__backflow_trace_noop as warn;
