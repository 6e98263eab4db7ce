//! Tracing setup: console layer on stderr plus an optional JSON file sink.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

/// Install the global subscriber.
///
/// Precedence for the console filter: `RUST_LOG`, then `--log-level`, then
/// `[logging].level`, then `info`.
pub fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    cfg: &rpm_config::Logging,
) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.level.as_deref())
        .unwrap_or("info")
        .to_string();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .map_err(|e| eyre::eyre!("invalid log level {level:?}: {e}"))?;

    let console_pretty = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });
    let console_json = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
    });

    let file_layer = match cfg.file.as_deref() {
        Some(path) => {
            let appender = file_appender(Path::new(path), cfg.rotation.as_deref())?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_pretty)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("install tracing subscriber: {e}"))?;
    Ok(())
}

fn file_appender(
    path: &Path,
    rotation: Option<&str>,
) -> eyre::Result<tracing_appender::rolling::RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file {path:?} has no file name"))?;
    std::fs::create_dir_all(dir).map_err(|e| eyre::eyre!("create log dir {dir:?}: {e}"))?;
    Ok(match rotation.unwrap_or("never") {
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    })
}
