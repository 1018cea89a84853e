//! Optional file-only logging: an `EnvFilter`-gated `fmt` layer over a
//! `tracing-appender` non-blocking file writer. Interactive rendering must
//! never share a stream with log lines, so there is no stdout/stderr layer
//! here at all — stdout carries the final selection and stderr is
//! reserved for fatal diagnostics.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global subscriber writing to `path` if logging was requested
/// (`--log-file` or `SMENU_LOG`). Returns the [`WorkerGuard`] the caller
/// must keep alive for the duration of the process; dropping it early
/// silently truncates buffered log lines.
pub fn init(path: Option<&str>) -> Option<WorkerGuard> {
    let path = path?;
    let path = std::path::Path::new(path);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path.file_name()?.to_str()?.to_string();

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("SMENU_LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return None;
    }
    Some(guard)
}

/// Resolves the effective log file path: `--log-file` wins, else
/// `SMENU_LOG`, else logging stays off.
pub fn resolve_log_path(cli_flag: Option<String>) -> Option<String> {
    cli_flag.or_else(|| std::env::var("SMENU_LOG").ok())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn resolve_prefers_cli_flag_over_env() {
        std::env::set_var("SMENU_LOG", "/tmp/env.log");
        let resolved = resolve_log_path(Some("/tmp/cli.log".to_string()));
        assert_eq!(resolved, Some("/tmp/cli.log".to_string()));
        std::env::remove_var("SMENU_LOG");
    }

    #[test]
    #[serial]
    fn resolve_is_none_when_nothing_set() {
        std::env::remove_var("SMENU_LOG");
        assert_eq!(resolve_log_path(None), None);
    }
}
