use crate::config::{ConfigError, LogConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of rolling log files
const LOG_FILE: &str = "scrapechain.log";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. When a log directory is
/// configured, output is also written to a daily rolling file; keep the
/// returned guard alive for as long as logs should be flushed.
pub fn init_tracing(config: &LogConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = build_filter(config)?;

    let (file_layer, guard) = match config.directory {
        Some(ref directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let installed = if config.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    installed.map_err(|e| ConfigError::Invalid(format!("tracing already initialised: {e}")))?;

    Ok(guard)
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ConfigError::Invalid(format!("bad log level '{}': {e}", config.level))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig {
            level: "scrapechain=loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_filter(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_level_filter_builds() {
        let config = LogConfig {
            level: "scrapechain=debug,warn".to_string(),
            ..Default::default()
        };
        assert!(build_filter(&config).is_ok());
    }
}
