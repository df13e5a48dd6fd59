use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR: &str = "./logs";
pub const LOG_FILE: &str = "option-scout.log";

/// Initialize logging to both console and file
/// Log files are created in ./logs directory with daily rotation
pub fn init_logging() -> anyhow::Result<()> {
    std::fs::create_dir_all(LOG_DIR)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE);

    tracing_subscriber::registry()
        .with(
            // Console output
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_ansi(true),
        )
        .with(
            // File output with JSON formatting
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_ansi(false)
                .json(),
        )
        .with(
            // RUST_LOG wins; info otherwise
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()?;

    Ok(())
}
