#![allow(dead_code)]

use {
    std::{
        collections::HashMap,
        fs,
        path::PathBuf,
        sync::{Mutex, atomic::{AtomicBool, AtomicUsize, Ordering}},
    },
    viewcount_runtime::kv::{KVStorage, StorageError},
};

/// In-memory storage that counts calls and can be told to fail.
pub struct RecordingStorage {
    values: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.lock().unwrap().insert(key.as_bytes().to_vec(), value.as_bytes().to_vec());
        self
    }

    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Reads a value without touching call counters.
    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().unwrap()
            .get(key.as_bytes())
            .map(|v| serde_json::from_slice(v).unwrap())
    }
}

impl KVStorage for RecordingStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::InternalError { description: "injected read failure".to_owned() });
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::InternalError { description: "injected write failure".to_owned() });
        }
        self.values.lock().unwrap().insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

/// Directory under the system temp dir, removed on drop.
pub struct DataCleanupGuard {
    path: PathBuf,
}

impl DataCleanupGuard {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("viewcount-test-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for DataCleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
