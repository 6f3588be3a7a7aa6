use std::sync::Arc;

use scoped_logger::{
    ContextLogger, Level, LevelConfig, LevelGate, LogContext, LogSink, Logger, LoggerName, bridge,
    open, render::Arg,
};

fn try_init_logger(gate: Arc<LevelGate>) -> Result<(), Box<dyn std::error::Error>> {
    let env_logger = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .build();

    ContextLogger::new(env_logger)
        .default_record("instance", "contexted_log_sync")
        .with_gate(gate)
        .try_init(log::LevelFilter::Trace)?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LevelConfig::from_env("SCOPED_LOG")?.with_threshold("inventory", Level::Debug);
    let gate = Arc::new(LevelGate::new(config));
    try_init_logger(Arc::clone(&gate))?;

    let logger = Logger::new(
        LoggerName::new("inventory.restock")?,
        Arc::clone(&gate),
        Arc::new(LogSink::new(
            env_logger::builder()
                .filter_level(log::LevelFilter::Trace)
                .build(),
        )),
    );

    log::info!("Initialized context logger");

    {
        let _guard = LogContext::new().record("user_id", "12345").enter();
        scoped_logger::info!(logger, "Restocking {} items", 3);

        // Shadow a key in a nested scope.
        {
            let _nested = open("user_id", "admin");
            scoped_logger::debug!(logger, "Escalated to {}", "admin");
        }

        let snapshot = bridge::capture_for_handoff();
        std::thread::spawn(snapshot.bind(|| {
            log::warn!(target: "inventory::worker", "Running on a worker thread");
        }))
        .join()
        .map_err(|_| "worker panicked")?;

        let err = std::io::Error::other("supplier unreachable");
        scoped_logger::error!(logger, "Restock of {} failed", "sku-7", Arg::error(err));
    }

    gate.reload(LevelConfig::new(Level::Error));
    scoped_logger::info!(logger, "Hidden after reload");
    logger.flush();

    Ok(())
}
