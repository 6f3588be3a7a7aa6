//! # Overview
//!
#![doc = include_utils::include_md!("README.md:description")]
//!
//! The crate is built around a handful of small pieces:
//!
//! - A per-execution-unit [`ContextStore`] of key-value pairs where a repeated key
//!   shadows the previous value instead of replacing it.
//! - Scopes ([`open`], [`LogContext::enter`]) that undo their pushes on every exit path.
//! - A [`LevelGate`] resolving thresholds by longest logger name prefix over an
//!   atomically reloadable [`LevelConfig`].
//! - A [`render`](render::render) step that substitutes `{}` placeholders and
//!   detaches a trailing error as the record's cause.
//! - An explicit [`bridge`] to hand context over to worker threads and tasks.
//!
//! Finished [`LogRecord`]s go to a [`Sink`]. Alternatively, [`ContextLogger`] plugs the
//! context and the gate into any logger that implements the standard [`Log`](log::Log)
//! trait, making it compatible with popular logging frameworks like [`env_logger`],
//! [`log4rs`] and others.
//!
//! ## Basic example
//!
#![doc = include_utils::include_md!("README.md:basic_example")]
//!
//! ## Handoff to workers
//!
#![doc = include_utils::include_md!("README.md:handoff_example")]
//!
//! [`env_logger`]: https://docs.rs/env_logger/latest/env_logger
//! [`log4rs`]: https://docs.rs/log4rs/latest/log4rs

use std::{borrow::Cow, sync::Arc};

pub use self::{
    bridge::{capture_for_handoff, install_on_worker, teardown_after_handoff},
    context::{LogContext, open},
    error::{Error, Result, ScopeError},
    future::FutureExt,
    gate::{ConfigSource, EnvConfig, LevelConfig, LevelGate},
    guard::ScopeGuard,
    level::Level,
    logger::{Logger, LoggerName},
    record::LogRecord,
    sink::{LogSink, MemorySink, Sink},
    snapshot::ContextSnapshot,
    store::{ContextStore, UndoToken},
    value::ContextValue,
};

pub mod bridge;
mod context;
mod error;
pub mod future;
pub mod gate;
pub mod guard;
mod level;
mod logger;
pub mod macros;
mod record;
pub mod render;
mod sink;
mod snapshot;
pub mod store;
mod value;

type StaticCowStr = Cow<'static, str>;

/// A logger wrapper that enhances log records with contextual properties.
///
/// `ContextLogger` wraps an existing logging implementation and adds the current
/// [`ContextSnapshot`] of the calling execution unit to every record as key-values.
/// With a [`LevelGate`] attached, records are also filtered by the gate, using the
/// record target (`a::b` read as `a.b`) as logger name.
///
/// # Example
///
/// ```
/// use log::{info, LevelFilter};
/// use scoped_logger::{ContextLogger, LogContext};
///
/// // Create a logger.
/// let env_logger = env_logger::builder().build();
/// let max_level = env_logger.filter();
/// // Wrap it with ContextLogger to enable context propagation.
/// let context_logger = ContextLogger::new(env_logger);
/// // Initialize the resulting logger.
/// context_logger.init(max_level);
///
/// // Create a context with properties
/// let ctx = LogContext::new()
///     .record("request_id", "req-123")
///     .record("user_id", 42);
///
/// // Use the context while logging
/// let _guard = ctx.enter();
/// info!("Processing request"); // Will include request_id and user_id properties
/// ```
pub struct ContextLogger {
    default_records: Vec<(StaticCowStr, ContextValue)>,
    gate: Option<Arc<LevelGate>>,
    inner: Box<dyn log::Log>,
}

impl ContextLogger {
    /// Creates a new [`ContextLogger`] that wraps the given logging implementation.
    ///
    /// The inner logger will receive log records enhanced with context properties
    /// from the current context store.
    pub fn new<L>(inner: L) -> Self
    where
        L: log::Log + 'static,
    {
        Self {
            default_records: Vec::new(),
            gate: None,
            inner: Box::new(inner),
        }
    }

    /// Filters records through `gate` before they reach the inner logger.
    ///
    /// The gate can be reloaded at any time. Records more verbose than the
    /// `max_level` given at initialization never reach the gate, so pass
    /// [`LevelFilter::Trace`](log::LevelFilter::Trace) if reloads may raise verbosity.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<LevelGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Initializes the global logger with the context logger.
    ///
    /// This should be called early in the execution of a Rust program. Any log events that occur before initialization will be ignored.
    ///
    /// # Panics
    ///
    /// Panics if a logger has already been set.
    pub fn init(self, max_level: log::LevelFilter) {
        self.try_init(max_level)
            .expect("ContextLogger::init should not be called after logger initialization");
    }

    /// Initializes the global logger with the context logger.
    ///
    /// This should be called early in the execution of a Rust program. Any log events that occur before initialization will be ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a logger has already been set.
    pub fn try_init(
        self,
        max_level: log::LevelFilter,
    ) -> std::result::Result<(), log::SetLoggerError> {
        log::set_max_level(max_level);
        log::set_boxed_logger(Box::new(self))
    }

    /// Adds a default record that will be included in all log entries.
    ///
    /// Default records are automatically added to all log entries, regardless of
    /// the current context. They are defined when the logger is created and remain
    /// constant throughout the application's lifetime.
    ///
    /// # Behavior with Duplicate Keys
    ///
    /// When logging, default records are added first, followed by records from the current
    /// context. If multiple records with the same key exist, the behavior depends on the
    /// underlying logger implementation. In most implementations, later records with the
    /// same key will typically replace earlier ones.
    #[must_use]
    pub fn default_record(
        mut self,
        key: impl Into<StaticCowStr>,
        value: impl Into<ContextValue>,
    ) -> Self {
        self.default_records.push((key.into(), value.into()));
        self
    }
}

fn logger_name(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

impl std::fmt::Debug for ContextLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextLogger")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl log::Log for ContextLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let gated_in = self.gate.as_ref().is_none_or(|gate| {
            gate.is_enabled(&logger_name(metadata.target()), metadata.level().into())
        });
        gated_in && self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if let Some(gate) = &self.gate {
            if !gate.is_enabled(&logger_name(record.target()), record.level().into()) {
                return;
            }
        }

        if let Some(context) = ContextStore::try_with_current(ContextStore::snapshot) {
            let extra_records = ExtraRecords {
                source: record.key_values(),
                default_records: &self.default_records,
                context: &context,
            };
            self.inner
                .log(&record.to_builder().key_values(&extra_records).build());
        } else {
            // If the context store is not available, log the original record.
            self.inner.log(record);
            // We can't use `log::error!` here because we are in the middle of logging and
            // this invocation becomes recursive.
            eprintln!("Error accessing context store: thread local storage is being destroyed");
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

struct ExtraRecords<'a> {
    source: &'a dyn log::kv::Source,
    default_records: &'a [(StaticCowStr, ContextValue)],
    context: &'a ContextSnapshot,
}

impl log::kv::Source for ExtraRecords<'_> {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn log::kv::VisitSource<'kvs>,
    ) -> std::result::Result<(), log::kv::Error> {
        for (key, value) in self.default_records {
            visitor.visit_pair(log::kv::Key::from_str(key), log::kv::Value::from(value.as_str()))?;
        }
        log::kv::Source::visit(self.context, visitor)?;
        self.source.visit(visitor)
    }
}
