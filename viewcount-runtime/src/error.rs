use {
    thiserror::Error,
    viewcount_core::RecordError,
    crate::kv::StorageError,
};

#[derive(Error, Debug, Eq, PartialEq)]
pub enum TableError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to decode item: {reason}")]
    Decode { reason: String },

    #[error("failed to encode item: {reason}")]
    Encode { reason: String },

    #[error("item is missing string key attribute {attribute:?}")]
    MissingKey { attribute: &'static str },
}

/// Reasons a counted view could not be recorded.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum CounterError {
    #[error("{0}")]
    Table(#[from] TableError),

    #[error("counter record has unexpected shape: {reason}")]
    DataShape { reason: String },

    #[error("failed to serialize response: {reason}")]
    Serialization { reason: String },
}

impl From<RecordError> for CounterError {
    fn from(err: RecordError) -> Self {
        Self::DataShape { reason: err.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("failed to open storage: {reason}")]
    Storage { reason: String },

    #[error("invalid listen address {address:?}: {reason}")]
    InvalidListenAddress { address: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind tcp listener: {reason}")]
    Bind { reason: String },

    #[error("failed to get local address of tcp listener: {reason}")]
    LocalAddr { reason: String },
}

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("invalid log level: {level:?}")]
    InvalidLevel { level: String },

    #[error("failed to create logger: {reason}")]
    FailedToCreate { reason: String },
}
