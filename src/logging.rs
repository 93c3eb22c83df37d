use std::{env, fs, path::PathBuf, sync::OnceLock};

use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

const LOG_DIR_ENV: &str = "SNAPDBX_LOG_DIR";
const LOG_PREFIX: &str = "snapdbx.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static PANIC_HOOK: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber: stdout plus a daily-rolling file under
/// the resolved log directory. Subsequent calls are no-ops.
pub fn init() -> Result<()> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }

    let log_dir = resolve_log_dir();
    fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_PREFIX);
    let (file_writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer().with_target(false);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    install_panic_hook();

    let _ = FILE_GUARD.set(guard);
    Ok(())
}

fn resolve_log_dir() -> PathBuf {
    if let Some(dir) = env::var_os(LOG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let Ok(current_dir) = env::current_dir() else {
        return PathBuf::from(".snapdbx").join("logs");
    };
    current_dir.join(".snapdbx").join("logs")
}

fn install_panic_hook() {
    PANIC_HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!("panic: {info}");
            previous(info);
        }));
    });
}
