//! Consumers of finished records.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::LogRecord;

/// Receives records once they have passed the gate and been rendered.
///
/// Formatting, output and delivery failures are the sink's own business. It
/// should return quickly since it runs on the caller's execution unit.
pub trait Sink: Send + Sync {
    fn accept(&self, record: &LogRecord);

    fn flush(&self) {}
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the records accepted so far.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Removes and returns the records accepted so far.
    #[must_use]
    pub fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Sink for MemorySink {
    fn accept(&self, record: &LogRecord) {
        self.lock().push(record.clone());
    }
}

/// Forwards records to a [`log::Log`] implementation.
///
/// The record context is passed as key-values, followed by a `cause` pair
/// when the record carries one.
pub struct LogSink {
    inner: Box<dyn log::Log>,
}

impl LogSink {
    pub fn new<L>(inner: L) -> Self
    where
        L: log::Log + 'static,
    {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

impl Sink for LogSink {
    fn accept(&self, record: &LogRecord) {
        let source = RecordSource { record };
        self.inner.log(
            &log::Record::builder()
                .level(record.level.into())
                .target(record.logger.as_str())
                .args(format_args!("{}", record.message))
                .key_values(&source)
                .build(),
        );
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

struct RecordSource<'a> {
    record: &'a LogRecord,
}

impl log::kv::Source for RecordSource<'_> {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn log::kv::VisitSource<'kvs>,
    ) -> Result<(), log::kv::Error> {
        log::kv::Source::visit(&self.record.context, visitor)?;
        if let Some(cause) = &self.record.cause {
            visitor.visit_pair(
                log::kv::Key::from_str("cause"),
                log::kv::Value::from_display(cause),
            )?;
        }
        Ok(())
    }
}
