use crate::modules::config::get_data_dir;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn get_log_dir() -> Result<PathBuf, String> {
    let data_dir = get_data_dir().map_err(|e| e.to_string())?;
    let log_dir = data_dir.join("logs");

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;
    }

    Ok(log_dir)
}

/// Initialize logger system
pub fn init_logger() {
    // Capture log macro logs (reqwest/hyper)
    let _ = tracing_log::LogTracer::init();

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    let log_dir = match get_log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            // Console only
            eprintln!("Failed to initialize log directory: {}", e);
            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .try_init();
            return;
        }
    };

    // Daily rolling file, no ANSI
    let file_appender = tracing_appender::rolling::daily(log_dir, "proxy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::Layer::new()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    // try_init so a second call is a no-op
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    // The writer must outlive every log call, so the guard lives until exit
    std::mem::forget(guard);

    info!("Logger system initialized (Console + File Persistence)");
}

/// Shorten a secret for log output
pub fn redact(secret: &str) -> String {
    const PREFIX_LEN: usize = 8;
    if secret.chars().count() <= PREFIX_LEN {
        return "<redacted>".to_string();
    }
    let prefix: String = secret.chars().take(PREFIX_LEN).collect();
    format!("{}...", prefix)
}

/// Log info message
pub fn log_info(message: &str) {
    info!("{}", message);
}

/// Log warning message
pub fn log_warn(message: &str) {
    warn!("{}", message);
}
