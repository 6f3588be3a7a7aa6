use std::sync::{Arc, Mutex};

use log::{LevelFilter, Record, kv::Key};
use scoped_logger::{ContextLogger, LevelGate};

pub trait RecordExt {
    fn get_record(&self, key: &str) -> Option<serde_json::Value>;
}

impl RecordExt for Record<'_> {
    fn get_record(&self, key: &str) -> Option<serde_json::Value> {
        let key = Key::from_str(key);
        let val = self.key_values().get(key)?;
        serde_json::to_value(val).ok()
    }
}

/// A record as seen by the inner logger.
#[derive(Debug, Clone)]
pub struct Captured {
    pub target: String,
    pub level: log::Level,
    pub message: String,
    pub records: serde_json::Map<String, serde_json::Value>,
}

impl Captured {
    pub fn from_record(record: &Record, keys: &[&str]) -> Self {
        let records = keys
            .iter()
            .filter_map(|key| Some(((*key).to_owned(), record.get_record(key)?)))
            .collect();
        Self {
            target: record.target().to_owned(),
            level: record.level(),
            message: record.args().to_string(),
            records,
        }
    }
}

/// Builds an `env_logger` that hands every record to `check` instead of printing it.
pub fn checking_logger<F>(check: F) -> env_logger::Logger
where
    F: Fn(&Record) -> std::io::Result<()> + Send + Sync + 'static,
{
    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .format(move |_fmt, record| check(record))
        .build()
}

/// Builds an `env_logger` that stores the given keys of every record.
pub fn capturing_logger(keys: &'static [&'static str]) -> (env_logger::Logger, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let logger = checking_logger(move |record| {
        sink.lock().unwrap().push(Captured::from_record(record, keys));
        Ok(())
    });
    (logger, captured)
}

pub fn check_logger_once<F>(check: F)
where
    F: Fn(&Record) -> std::io::Result<()> + Send + Sync + 'static,
{
    let level_filter = LevelFilter::Trace;
    ContextLogger::new(checking_logger(check)).init(level_filter);
}

pub fn install_gated_logger(
    gate: Arc<LevelGate>,
    keys: &'static [&'static str],
) -> Arc<Mutex<Vec<Captured>>> {
    let (logger, captured) = capturing_logger(keys);
    ContextLogger::new(logger)
        .default_record("service", "checkout")
        .with_gate(gate)
        .init(LevelFilter::Trace);
    captured
}
