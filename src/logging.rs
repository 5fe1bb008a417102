use crate::config::{Config, LogLevel};
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Keeps the file writer alive; drop it only at process exit
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Filter directive: `RUST_LOG` wins, then `--verbose`, then the configured level
fn filter_directive(level: LogLevel, verbose: bool, rust_log: Option<String>) -> String {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ if verbose => "dbchat=debug,warn".to_string(),
        _ => format!("dbchat={level},warn"),
    }
}

/// Install the global subscriber: a file layer in the config directory and an
/// optional stderr layer. Must be called once, before any other logging.
pub fn init(config: &Config, verbose: bool) -> io::Result<LoggingGuard> {
    let directive = filter_directive(
        config.logging.level,
        verbose,
        std::env::var("RUST_LOG").ok(),
    );

    let mut file_guard = None;
    let mut log_file = None;
    let file_layer = if config.logging.file_output {
        let path = config
            .log_file_path()
            .map_err(|e| io::Error::other(e.to_string()))?;
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log file path has no file name"))?;
        std::fs::create_dir_all(directory)?;

        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);
        log_file = Some(path);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(&directive)),
        )
    } else {
        None
    };

    let console_layer = (config.logging.console_output || verbose).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(EnvFilter::new(&directive))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LogLevel::Info, false, None, "dbchat=info,warn")]
    #[case(LogLevel::Error, true, None, "dbchat=debug,warn")]
    #[case(LogLevel::Info, true, Some("trace"), "trace")]
    #[case(LogLevel::Warn, false, Some("  "), "dbchat=warn,warn")]
    fn test_filter_directive(
        #[case] level: LogLevel,
        #[case] verbose: bool,
        #[case] rust_log: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            filter_directive(level, verbose, rust_log.map(String::from)),
            expected
        );
    }
}
