use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use scoped_logger::{
    Level, LevelConfig, LevelGate, LogSink, Logger, LoggerName, open, render::Arg,
};

use crate::common::{Captured, capturing_logger};

pub mod common;

fn logger(keys: &'static [&'static str]) -> (Logger, Arc<Mutex<Vec<Captured>>>) {
    let (inner, captured) = capturing_logger(keys);
    let logger = Logger::new(
        LoggerName::new("payments.refunds").unwrap(),
        Arc::new(LevelGate::new(LevelConfig::new(Level::Info))),
        Arc::new(LogSink::new(inner)),
    );
    (logger, captured)
}

#[test]
fn test_log_sink_forwards_context_as_key_values() {
    let (logger, captured) = logger(&["order_id", "tenant"]);

    let _tenant = open("tenant", "acme");
    let _order = open("order_id", "o-981");
    scoped_logger::info!(logger, "refund of {} issued", "12.50 EUR");

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let record = &captured[0];
    assert_eq!(record.target, "payments.refunds");
    assert_eq!(record.level, log::Level::Info);
    assert_eq!(record.message, "refund of 12.50 EUR issued");
    assert_eq!(record.records["tenant"], "acme");
    assert_eq!(record.records["order_id"], "o-981");
}

#[test]
fn test_log_sink_forwards_cause_chain() {
    let (logger, captured) = logger(&["cause"]);

    let err = std::io::Error::other("gateway timeout");
    scoped_logger::error!(logger, "refund {} failed", "r-2", Arg::error(err));
    scoped_logger::debug!(logger, "never forwarded");
    logger.flush();

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "refund r-2 failed");
    assert_eq!(captured[0].records["cause"], "gateway timeout");
}
