use std::sync::Arc;

use pretty_assertions::assert_eq;
use scoped_logger::{Level, LevelConfig, LevelGate, open};

use crate::common::install_gated_logger;

pub mod common;

#[test]
fn test_context_logger_gates_and_enriches_records() {
    let gate = Arc::new(LevelGate::new(
        LevelConfig::new(Level::Warn).with_threshold("app.db", Level::Debug),
    ));
    let captured = install_gated_logger(Arc::clone(&gate), &["service", "request_id"]);

    let _request = open("request_id", "req-11");
    log::debug!(target: "app::db::pool", "checked out connection");
    log::info!(target: "app.http", "hidden by the default threshold");
    log::warn!(target: "app.http", "slow response");

    gate.reload(LevelConfig::new(Level::Info));
    log::info!(target: "app.http", "visible after reload");
    log::debug!(target: "app::db::pool", "hidden after reload");

    let captured = captured.lock().unwrap().clone();
    let messages: Vec<_> = captured
        .iter()
        .filter(|record| record.target.starts_with("app"))
        .map(|record| (record.level, record.message.as_str()))
        .collect();
    assert_eq!(
        messages,
        vec![
            (log::Level::Debug, "checked out connection"),
            (log::Level::Warn, "slow response"),
            (log::Level::Info, "visible after reload"),
        ]
    );

    let first = &captured[0];
    assert_eq!(first.records["service"], "checkout");
    assert_eq!(first.records["request_id"], "req-11");
}
