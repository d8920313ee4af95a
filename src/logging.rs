use crate::draw::settings::DrawSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging. Without `debug` the level is forced to `info`; with it
/// `RUST_LOG` may override the default `debug` level.
///
/// When `log_file` is given, output goes to that file instead of stdout.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Forcing `info` keeps a stray `RUST_LOG` from turning on verbose output.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match log_file.as_deref().and_then(split_log_path) {
        Some((dir, file_name)) => {
            if let Err(err) = std::fs::create_dir_all(&dir) {
                eprintln!("failed to create log folder {}: {err}", dir.display());
            }
            let appender = tracing_appender::rolling::never(dir, file_name);
            builder.with_ansi(false).with_writer(appender).try_init()
        }
        None => builder.try_init(),
    };

    if result.is_ok() {
        let debug_enabled = debug;
        tracing::debug!(debug_enabled, "logging initialised");
    }
}

/// Initialise logging with the level chosen by `debug_mode` in the draw
/// settings.
pub fn init_from_settings(settings: &DrawSettings, log_file: Option<PathBuf>) {
    init(settings.debug_mode, log_file);
}

fn split_log_path(path: &std::path::Path) -> Option<(PathBuf, std::ffi::OsString)> {
    let file_name = path.file_name()?.to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, file_name))
}
