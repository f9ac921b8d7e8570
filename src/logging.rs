use crate::config::Config;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. The terminal belongs to the map, so logs go
/// to the configured file and only fall back to stderr when it cannot be opened.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    if !config.log_enabled {
        return None;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&config.log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match open_log_file(config.log_file.trim()) {
        Some(file) => tracing_appender::non_blocking(file),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
    Some(guard)
}

fn filter_directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        "info".to_string()
    } else if level.contains('=') {
        level.to_string()
    } else {
        // Bare levels apply to this crate only; dependencies stay at warn.
        format!("warn,airline_map={level}")
    }
}

fn open_log_file(path: &str) -> Option<File> {
    if path.is_empty() {
        return None;
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = fs::create_dir_all(parent);
        }
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

#[cfg(test)]
mod tests {
    use super::{filter_directive, init, open_log_file};
    use crate::config::Config;

    #[test]
    fn bare_level_is_scoped_to_crate() {
        assert_eq!(filter_directive("debug"), "warn,airline_map=debug");
        assert_eq!(filter_directive("  "), "info");
        assert_eq!(filter_directive("reqwest=trace"), "reqwest=trace");
    }

    #[test]
    fn disabled_logging_installs_nothing() {
        let cfg = Config {
            log_enabled: false,
            ..Config::default()
        };
        assert!(init(&cfg).is_none());
    }

    #[test]
    fn empty_log_path_has_no_file() {
        assert!(open_log_file("").is_none());
    }
}
