use {
    std::{
        sync::{Arc, Mutex, atomic::{AtomicU64, Ordering}},
        path::{Path, PathBuf, Component},
        fs,
        io::{self, Write},
        process,
    },
    thiserror::Error,
    rusqlite::Connection,
};

pub trait KVStorage {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum StorageError {
    /// Storage operation failed because of internal error in storage implementation
    /// If this happens, something is very broken (similar to 503 response in http).
    #[error("internal io error: {description}")]
    InternalError {
        description: String,
    },

    /// Key used in this operation violates one of constraints set by this storage backend.
    #[error("key used in this operation violates one of constraints set by this storage backend: {description}")]
    KeyConstraintError {
        description: String,
    },
}

#[derive(Clone)]
pub struct SqliteStorage {
    connection: Arc<Mutex<Connection>>,
}

#[derive(Error, Debug)]
pub enum SqliteStorageConnectionError {
    #[error("failed to open connection: {0:?}")]
    ConnectionOpenError(rusqlite::Error),

    #[error("failed to init database: {0:?}")]
    DatabaseInitError(rusqlite::Error),
}

impl SqliteStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SqliteStorageConnectionError> {
        Self::from_connection(
            Connection::open(path)
                .map_err(SqliteStorageConnectionError::ConnectionOpenError)?
        )
    }

    pub fn in_memory() -> Result<Self, SqliteStorageConnectionError> {
        Self::from_connection(
            Connection::open_in_memory()
                .map_err(SqliteStorageConnectionError::ConnectionOpenError)?
        )
    }

    fn from_connection(connection: Connection) -> Result<Self, SqliteStorageConnectionError> {
        connection.execute("create table if not exists kv (key blob primary key, value blob)", ())
            .map_err(SqliteStorageConnectionError::DatabaseInitError)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }
}

impl KVStorage for SqliteStorage {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let connection = self.connection.lock()
            .map_err(|err| StorageError::InternalError { description: format!("failed to acquire sqlite connection: {err:?}") })?;
        connection.execute("insert or replace into kv (key, value) values (?1, ?2)", (&key, &value))
            .map_err(|err| StorageError::InternalError { description: format!("failed to execute sqlite query: {err:?}") })
            .map(|_| ())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let connection = self.connection.lock()
            .map_err(|err| StorageError::InternalError { description: format!("failed to acquire sqlite connection: {err:?}") })?;
        let mut stmt = connection.prepare("select value from kv where key = ?1")
            .map_err(|err| StorageError::InternalError { description: format!("failed to prepare sqlite query: {err:?}") })?;
        let mut rows = stmt.query([key])
            .map_err(|err| StorageError::InternalError { description: format!("failed to map sqlite result to value: {err:?}") })?;

        let res = rows.next()
            .map_err(|err| StorageError::InternalError { description: format!("failed to read row from sqlite result: {err:?}") })?
            .map(|v| v.get(0));

        match res {
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(err)) => Err(StorageError::InternalError { description: format!("failed to decode sqlite result: {err:?}") }),
            None => Ok(None)
        }
    }
}

/// Stores each key as a file under `path`. Keys containing `/` end up in subdirectories.
/// Values are written to a temporary sibling file first and then renamed over the key, so readers
/// see either the previous or the new value and never a partially written one.
#[derive(Clone)]
pub struct FsStorage {
    path: PathBuf,
}

#[derive(Error, Debug)]
pub enum FsStorageInitError {
    #[error("failed to create directory for filesystem storage: {0:?}")]
    FailedToCreateDirectory(std::io::Error),
}

impl FsStorage {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, FsStorageInitError> {
        let path = path.into();
        fs::create_dir_all(&path)
            .map_err(FsStorageInitError::FailedToCreateDirectory)?;
        Ok(Self { path })
    }

    fn path_for_key(&self, key: &[u8]) -> Result<PathBuf, StorageError> {
        let key = std::str::from_utf8(key)
            .map_err(|err| StorageError::KeyConstraintError {
                description: format!("should be able to decode as Utf8, got error: {err:?}"),
            })?;

        let relative = Path::new(key);
        if key.is_empty() || !relative.components().all(|v| matches!(v, Component::Normal(_))) {
            return Err(StorageError::KeyConstraintError {
                description: format!("key should be a relative path without special components, got: {key:?}"),
            });
        }

        Ok(self.path.join(relative))
    }
}

impl KVStorage for FsStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for_key(key)?) {
            Ok(v) => Ok(Some(v)),
            Err(err) => {
                if err.kind() == io::ErrorKind::NotFound {
                    Ok(None)
                } else {
                    Err(StorageError::InternalError { description: format!("failed to read file: {err:?}") })
                }
            }
        }
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for_key(key)?;
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|err| StorageError::InternalError { description: format!("failed to create parent directory for FsStorage: {err:?}") })?;
            }
        }

        let temp_path = temp_path_for(&path);
        if let Err(err) = write_synced(&temp_path, value).and_then(|_| fs::rename(&temp_path, &path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::InternalError { description: format!("failed to write file: {err:?}") });
        }

        Ok(())
    }
}

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path.file_name().map(|v| v.to_string_lossy()).unwrap_or_default();
    let sequence = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{file_name}.{}.{sequence}.tmp", process::id()))
}

fn write_synced(path: &Path, value: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value)?;
    file.sync_all()
}

pub struct NamespacedStorage<T> {
    namespace: Vec<u8>,
    inner: T,
}

impl<T> NamespacedStorage<T> {
    pub fn new(namespace: impl Into<Vec<u8>>, inner: T) -> Self {
        Self {
            namespace: namespace.into(),
            inner,
        }
    }

    fn namespaced_key(&self, key: &[u8]) -> Vec<u8> {
        let mut namespaced_key = Vec::with_capacity(self.namespace.len() + key.len());
        namespaced_key.extend_from_slice(&self.namespace);
        namespaced_key.extend_from_slice(key);
        namespaced_key
    }
}

impl<T: KVStorage> KVStorage for NamespacedStorage<T> {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> { self.inner.set(&self.namespaced_key(key), value) }
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> { self.inner.get(&self.namespaced_key(key)) }
}

#[derive(Clone)]
pub struct BoxedStorage {
    inner: Arc<Box<dyn KVStorage + Send + Sync>>,
}

impl BoxedStorage {
    pub fn new<T: KVStorage + Send + Sync + 'static>(inner: T) -> Self {
        Self {
            inner: Arc::new(Box::new(inner)),
        }
    }
}

impl KVStorage for BoxedStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }
}

impl<T: KVStorage> KVStorage for Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.as_ref().set(key, value)
    }
}

pub trait WithKey: Sized {
    fn with_key(self, key: &[u8], value: &[u8]) -> Result<Self, StorageError>;
}

impl<S: KVStorage> WithKey for S {
    fn with_key(self, key: &[u8], value: &[u8]) -> Result<Self, StorageError> {
        self.set(key, value)?;
        Ok(self)
    }
}
