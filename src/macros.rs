//! Level-gated emit macros.
//!
//! Unlike calling [`Logger::emit`](crate::Logger::emit) directly, the macros
//! check the gate first and only evaluate the argument expressions when the
//! level is enabled.
//!
//! ```
//! use std::sync::Arc;
//!
//! use scoped_logger::{Level, LevelConfig, LevelGate, Logger, MemorySink, debug, info};
//!
//! let sink = Arc::new(MemorySink::new());
//! let gate = Arc::new(LevelGate::new(LevelConfig::new(Level::Info)));
//! let logger = Logger::new("app".parse().unwrap(), gate, sink.clone());
//!
//! fn expensive_dump() -> String {
//!     unreachable!("never built while debug is disabled")
//! }
//!
//! debug!(logger, "state: {}", expensive_dump());
//! info!(logger, "listening on port {}", 8080);
//!
//! assert_eq!(sink.records()[0].message, "listening on port 8080");
//! ```

/// Emits a record at the given level; arguments are built only if it passes the gate.
///
/// Evaluates to the emitted [`LogRecord`](crate::LogRecord), if any.
#[macro_export]
macro_rules! emit {
    ($logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::Level = $level;
        if logger.is_enabled(level) {
            ::core::option::Option::Some(logger.emit_unchecked(
                level,
                $template,
                &[$($crate::render::Arg::from($arg)),*],
            ))
        } else {
            ::core::option::Option::None
        }
    }};
}

/// Emits a trace-level record, see [`emit!`].
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($rest:tt)+) => {
        $crate::emit!($logger, $crate::Level::Trace, $($rest)+)
    };
}

/// Emits a debug-level record, see [`emit!`].
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::emit!($logger, $crate::Level::Debug, $($rest)+)
    };
}

/// Emits an info-level record, see [`emit!`].
#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::emit!($logger, $crate::Level::Info, $($rest)+)
    };
}

/// Emits a warn-level record, see [`emit!`].
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::emit!($logger, $crate::Level::Warn, $($rest)+)
    };
}

/// Emits an error-level record, see [`emit!`].
#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::emit!($logger, $crate::Level::Error, $($rest)+)
    };
}
