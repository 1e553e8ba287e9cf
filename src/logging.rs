// Logging setup for warpfield

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

// Keep the guards alive for the lifetime of the program
static LOG_GUARD: OnceLock<Vec<WorkerGuard>> = OnceLock::new();

/// An empty `log_file` means file logging is disabled
fn log_file_path(settings: &LoggingSettings) -> Option<PathBuf> {
    if settings.log_file.is_empty() {
        None
    } else {
        Some(PathBuf::from(&settings.log_file))
    }
}

/// Initialize logging from the loaded config: an optional non-blocking
/// file writer plus an optional console mirror, INFO by default with
/// DEBUG for this crate.
pub fn init_logging(settings: &LoggingSettings) {
    let mut guards = Vec::new();

    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
        .add_directive("warpfield=debug".parse().expect("static directive"));

    let file_layer = log_file_path(settings).and_then(|path| {
        let parent = path.parent()?;
        let file_name = path.file_name()?.to_str()?;

        let file_appender = tracing_appender::rolling::never(parent, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
    });

    let console_layer = if settings.console {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    let _ = LOG_GUARD.set(guards);
}
