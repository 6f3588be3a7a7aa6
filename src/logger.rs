//! Named loggers and the emit path.

use std::{borrow::Cow, fmt, str::FromStr, sync::Arc};

use serde::Serialize;

use crate::{
    Error, Level, LevelGate, LogRecord, Result, Sink, StaticCowStr, render::Arg,
    store::ContextStore,
};

/// A dotted hierarchical logger name such as `app.db.pool`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LoggerName(StaticCowStr);

impl LoggerName {
    /// Validates `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoggerName`] if the name is empty or has an
    /// empty segment.
    pub fn new(name: impl Into<StaticCowStr>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::logger_name(name, "empty name"));
        }
        if name.split('.').any(str::is_empty) {
            return Err(Error::logger_name(name, "empty segment"));
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.split('.')
    }

    /// The name without its last segment, `None` for a top-level name.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Self(Cow::Owned(parent.to_owned())))
    }

    /// Appends `segment` to this name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoggerName`] if the result is not well formed.
    pub fn child(&self, segment: &str) -> Result<Self> {
        Self::new(format!("{}.{segment}", self.0))
    }
}

impl fmt::Display for LoggerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LoggerName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.to_owned())
    }
}

impl AsRef<str> for LoggerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A named logger bound to a level gate and a sink.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use scoped_logger::{Level, LevelConfig, LevelGate, Logger, MemorySink, open};
///
/// let gate = Arc::new(LevelGate::new(LevelConfig::new(Level::Info)));
/// let sink = Arc::new(MemorySink::new());
/// let logger = Logger::new("app.auth".parse().unwrap(), gate, sink.clone());
///
/// let _request = open("request_id", "req-1");
/// logger.emit(Level::Info, "User {} logged in", &["alice".into()]);
/// logger.emit(Level::Debug, "not emitted", &[]);
///
/// let records = sink.records();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].message, "User alice logged in");
/// assert_eq!(records[0].context.get("request_id"), Some("req-1"));
/// ```
#[derive(Clone)]
pub struct Logger {
    name: LoggerName,
    gate: Arc<LevelGate>,
    sink: Arc<dyn Sink>,
}

impl Logger {
    pub fn new(name: LoggerName, gate: Arc<LevelGate>, sink: Arc<dyn Sink>) -> Self {
        Self { name, gate, sink }
    }

    /// A logger for `segment` nested below this one, sharing gate and sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoggerName`] if `segment` makes the name malformed.
    pub fn child(&self, segment: &str) -> Result<Self> {
        Ok(Self {
            name: self.name.child(segment)?,
            gate: Arc::clone(&self.gate),
            sink: Arc::clone(&self.sink),
        })
    }

    #[must_use]
    pub const fn name(&self) -> &LoggerName {
        &self.name
    }

    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        self.gate.is_enabled(self.name.as_str(), level)
    }

    /// Renders and delivers a record if `level` passes the gate.
    ///
    /// The record handed to the sink is also returned.
    pub fn emit(&self, level: Level, template: &str, args: &[Arg]) -> Option<LogRecord> {
        if !self.is_enabled(level) {
            return None;
        }
        Some(self.emit_unchecked(level, template, args))
    }

    /// Like [`Logger::emit`], but the arguments are only built when the level is enabled.
    pub fn emit_with<F>(&self, level: Level, template: &str, args: F) -> Option<LogRecord>
    where
        F: FnOnce() -> Vec<Arg>,
    {
        if !self.is_enabled(level) {
            return None;
        }
        Some(self.emit_unchecked(level, template, &args()))
    }

    /// Flushes the sink.
    pub fn flush(&self) {
        self.sink.flush();
    }

    /// Renders and delivers a record without consulting the gate.
    #[doc(hidden)]
    pub fn emit_unchecked(&self, level: Level, template: &str, args: &[Arg]) -> LogRecord {
        let context = ContextStore::try_with_current(ContextStore::snapshot).unwrap_or_default();
        let record = LogRecord::new(level, self.name.clone(), template, args, context);
        self.sink.accept(&record);
        record
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
