//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured level. Output goes to stderr, either
//! human-readable or JSON lines, and optionally to a daily-rolling file.

use crate::config::LoggingConfig;
use crate::error::{PipeworksError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&config.level)?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    });

    let guard = match &config.file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path)?;
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| PipeworksError::Config(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}

/// `RUST_LOG` if set, otherwise `level`
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| PipeworksError::Config(format!("Invalid log level '{}': {}", level, e)))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| PipeworksError::Config(format!("Log file path {:?} has no file name", path)))?
        .to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("logs/pipeworks.log")).unwrap();
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(name, OsString::from("pipeworks.log"));

        let (dir, _) = split_log_path(Path::new("pipeworks.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
    }

    #[test]
    fn test_split_log_path_without_file_name() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_env_filter_accepts_directives() {
        assert!(env_filter("info,pipeworks=trace").is_ok());
    }
}
