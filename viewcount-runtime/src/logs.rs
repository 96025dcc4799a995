use {
    std::str::FromStr,
    tracing::Level,
    tracing_subscriber::FmtSubscriber,
    crate::{config::LoggerConfig, error::LoggerError},
};

const DEFAULT_LEVEL: Level = Level::INFO;

/// Installs the global subscriber. Can only succeed once per process.
pub fn init_logger(config: &LoggerConfig) -> Result<(), LoggerError> {
    match config {
        LoggerConfig::Stdout { level } => {
            let level = match level {
                Some(v) => Level::from_str(v).map_err(|_| LoggerError::InvalidLevel { level: v.clone() })?,
                None => DEFAULT_LEVEL,
            };

            FmtSubscriber::builder()
                .with_max_level(level)
                .try_init()
                .map_err(|err| LoggerError::FailedToCreate { reason: err.to_string() })
        },
        LoggerConfig::Noop => Ok(()),
    }
}
