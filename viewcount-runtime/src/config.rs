use {
    std::{fs, net::SocketAddr, path::{Path, PathBuf}},
    serde::Deserialize,
    crate::{
        kv::{BoxedStorage, FsStorage, SqliteStorage},
        table::Table,
        function::{CounterFunction, DEFAULT_COUNTER_ID, DEFAULT_TABLE_NAME},
        error::ConfigError,
    },
};

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(skip_deserializing)]
    pub config_path: Option<PathBuf>,

    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub table: TableConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
}

impl ServerConfig {
    pub fn load(file_path: PathBuf) -> Result<Self, ConfigError> {
        let config = fs::read_to_string(&file_path)
            .map_err(|err| ConfigError::Read { path: file_path.display().to_string(), reason: err.to_string() })?;
        let mut config = Self::from_yaml(&config)?;
        config.config_path = Some(file_path);
        Ok(config)
    }

    pub fn from_yaml(config: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(config).map_err(|err| ConfigError::Parse { reason: err.to_string() })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|err: std::net::AddrParseError| ConfigError::InvalidListenAddress {
            address: self.listen.clone(),
            reason: err.to_string(),
        })
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_owned()
}

#[derive(Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct TableConfig {
    #[serde(default = "default_table_name")]
    pub name: String,
    #[serde(default = "default_counter_id")]
    pub counter_id: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: default_table_name(),
            counter_id: default_counter_id(),
        }
    }
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_owned()
}

fn default_counter_id() -> String {
    DEFAULT_COUNTER_ID.to_owned()
}

#[derive(Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum StorageConfig {
    #[serde(rename = "sqlite")]
    Sqlite {
        path: String,
    },
    #[serde(rename = "fs")]
    Fs {
        path: String,
    },
    /// Data is lost when the process exits.
    #[serde(rename = "memory")]
    Memory,
}

#[derive(Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum LoggerConfig {
    #[serde(rename = "stdout")]
    Stdout {
        level: Option<String>,
    },
    #[serde(rename = "noop")]
    Noop,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::Stdout { level: None }
    }
}

pub fn storage_from_config(config: &StorageConfig) -> Result<BoxedStorage, ConfigError> {
    Ok(match config {
        StorageConfig::Sqlite { path } => {
            if let Some(parent) = Path::new(path).parent().filter(|v| !v.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|err| ConfigError::Storage { reason: format!("failed to create directory for sqlite database: {err}") })?;
            }
            BoxedStorage::new(
                SqliteStorage::new(path).map_err(|err| ConfigError::Storage { reason: err.to_string() })?
            )
        },
        StorageConfig::Fs { path } => BoxedStorage::new(
            FsStorage::new(path).map_err(|err| ConfigError::Storage { reason: err.to_string() })?
        ),
        StorageConfig::Memory => BoxedStorage::new(
            SqliteStorage::in_memory().map_err(|err| ConfigError::Storage { reason: err.to_string() })?
        ),
    })
}

pub fn function_from_config(config: &ServerConfig) -> Result<CounterFunction<BoxedStorage>, ConfigError> {
    let storage = storage_from_config(&config.storage)?;
    Ok(CounterFunction::new(Table::new(config.table.name.clone(), storage), config.table.counter_id.clone()))
}
