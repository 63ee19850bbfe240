//! Logging Infrastructure
//!
//! Structured logging via `tracing`, with an optional daily rolling file.

use std::path::Path;

/// Initialize the logger (stdout, `info`)
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` takes precedence over `log_level` when set. Calling this more
/// than once is harmless: later calls keep the first subscriber.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    // Add file output if log_dir exists
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists() {
            let file_appender = tracing_appender::rolling::daily(log_path, "pos-core");
            let _ = subscriber
                .with_ansi(false)
                .with_writer(file_appender)
                .try_init();
            return;
        }
        eprintln!("log directory {dir} does not exist, logging to stdout");
    }

    let _ = subscriber.try_init();
}
