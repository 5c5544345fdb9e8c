//! Logging initialisation for pve-ontap-snapshot.
//!
//! Logs go to stderr, filtered by `RUST_LOG` or else by the `--loglevel`
//! flag. When `PVE_ONTAP_LOG=1` they are additionally written to
//! `pve-ontap-snapshot.log` in the per-user log directory.
//!
//! Returns a guard that must be kept alive for the duration of the process
//! so that buffered log lines are flushed on exit.

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::paths::ToolPaths;

/// Verbosity accepted by `--loglevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialise the global tracing subscriber.
///
/// Call once from `main`, store the returned `LogGuard` in a local variable
/// for the duration of the process.
pub fn init(level: LogLevel) -> LogGuard {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
    };

    let file_guard = if std::env::var("PVE_ONTAP_LOG").as_deref() == Ok("1") {
        let dir = ToolPaths::resolve()
            .filter(|p| p.ensure_logs().is_ok())
            .map(|p| p.logs)
            .unwrap_or_else(std::env::temp_dir);
        let file_appender = tracing_appender::rolling::never(dir, "pve-ontap-snapshot.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

        tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();

        None
    };

    LogGuard {
        _file_guard: file_guard,
    }
}
