use std::{sync::Arc, time::Duration};

use scoped_logger::{
    ContextLogger, FutureExt, Level, LevelConfig, LevelGate, LogContext, bridge, open,
};

fn try_init_logger(gate: Arc<LevelGate>) -> Result<(), Box<dyn std::error::Error>> {
    let level = log::LevelFilter::Trace;

    let logger = structured_logger::Builder::with_level(level.as_str())
        .with_target_writer("*", structured_logger::json::new_writer(std::io::stdout()))
        .build();
    ContextLogger::new(logger)
        .default_record("instance", "contexted_log_async")
        .with_gate(gate)
        .try_init(level)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let gate = Arc::new(LevelGate::new("info,checkout=debug".parse()?));
    try_init_logger(Arc::clone(&gate))?;

    log::info!("Initialized context logger");

    // Create a new context with properties.
    let log_context = LogContext::new().record("user_id", "12345");
    let first_future = async move {
        log::info!(target: "checkout", "Logging in");
        // Nested context with additional properties
        async move {
            log::debug!(target: "checkout", "User logged in successfully");
            tokio::task::yield_now().await;
        }
        .with_current_context()
        .await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        log::info!(target: "checkout", "Login completed");
    }
    .in_log_context(log_context);

    let log_context = LogContext::new()
        .record("name", "Alice")
        .record("age", 25)
        .record("email", "alice@example.com");
    let second_future = async move {
        tokio::task::yield_now().await;

        log::info!("Another future pending");
        tokio::time::sleep(Duration::from_millis(100)).await;
        log::info!("Future completed");
    }
    .in_log_context(log_context);

    let log_context = LogContext::new().record("name", "Bob");
    let third_future = tokio::spawn(
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _operation = open("operation", "logout");
            log::info!("Third future completed");
        }
        .in_log_context(log_context),
    );

    let ((), (), res) = tokio::join!(first_future, second_future, third_future);
    res?;

    // Hand the current context to a blocking worker.
    let _request = open("request_id", "req-9");
    let job = bridge::capture_for_handoff().bind(|| log::info!("Blocking work done"));
    tokio::task::spawn_blocking(job).await?;

    gate.reload(LevelConfig::new(Level::Warn));
    log::info!("Not printed after reload");

    Ok(())
}
