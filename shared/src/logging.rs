//! Logging setup shared by the pipeline binaries

use chrono::{DateTime, Utc};

/// Initialize the tracing subscriber for stdout logging.
///
/// `log_level` applies to the pipeline crates; noisy transport crates are
/// pinned to `warn`. `RUST_LOG` is not consulted so behavior matches the
/// `--log-level` flag exactly.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    let base_level = log_level.unwrap_or("info");
    let filter = format!("injector={base_level},shared={base_level},redis=warn,scylla=warn");

    fmt()
        .with_env_filter(EnvFilter::new(&filter))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}
