//! Logging init: service log plus a separate session audit log under the XDG
//! state dir, or stderr when the state dir cannot be written.
//!
//! Sign-in and sign-out events carry the `herbarium::audit` target. They go to
//! the service log like everything else and are also appended to
//! `herbarium-audit.log`, which holds nothing but those events.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info,herbarium=debug,herbarium_core=debug,tower_http=info";

/// Target for session audit events.
pub const AUDIT_TARGET: &str = "herbarium::audit";

const SERVICE_LOG: &str = "herbarium.log";
const AUDIT_LOG: &str = "herbarium-audit.log";

/// Append-only log file. Each event gets its own handle; if the handle cannot
/// be cloned the event is written to stderr instead of being lost.
struct LogFile {
    path: PathBuf,
    file: fs::File,
}

impl LogFile {
    fn open(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?;
        Ok(Self { path, file })
    }
}

enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.file
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn is_audit_event(meta: &tracing::Metadata<'_>) -> bool {
    meta.target() == AUDIT_TARGET
}

/// Layer that writes only audit events. `RUST_LOG` does not apply to it.
fn audit_layer<S>(sink: LogFile) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(sink)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter_fn(is_audit_event))
}

/// Initialize structured logging to `~/.local/state/herbarium/herbarium.log`
/// and the audit log next to it.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let log_dir = crate::config::state_dir()?;
    fs::create_dir_all(&log_dir)?;

    let service = LogFile::open(&log_dir, SERVICE_LOG)?;
    let audit = LogFile::open(&log_dir, AUDIT_LOG)?;
    let service_path = service.path.clone();
    let audit_path = audit.path.clone();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(service)
                .with_ansi(false)
                .with_filter(env_filter()),
        )
        .with(audit_layer(audit))
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber: {}", e))?;

    tracing::info!(
        audit = %audit_path.display(),
        "herbarium logging initialized at {}",
        service_path.display()
    );

    Ok(())
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
/// Audit events stay in the stderr stream under their target.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_log_holds_only_session_events() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LogFile::open(dir.path(), AUDIT_LOG).unwrap();
        let path = sink.path.clone();

        let subscriber = tracing_subscriber::registry().with(audit_layer(sink));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: AUDIT_TARGET, email = "ana@example.org", "session started");
            tracing::info!(plant_id = 4, "stock adjusted");
            tracing::debug!(target: AUDIT_TARGET, email = "ben@example.org", "session ended");
        });

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("session started"));
        assert!(text.contains("ana@example.org"));
        assert!(text.contains("session ended"));
        assert!(!text.contains("stock adjusted"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn log_file_open_fails_for_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(LogFile::open(&missing, SERVICE_LOG).is_err());
    }
}
