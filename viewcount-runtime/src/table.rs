use {
    tracing::debug,
    viewcount_core::Item,
    crate::{
        kv::{KVStorage, NamespacedStorage},
        error::TableError,
    },
};

pub const KEY_ATTRIBUTE: &str = "id";

/// Item level view of a kv storage. Every item lives under `<table name>/<id>`.
pub struct Table<S> {
    name: String,
    storage: NamespacedStorage<S>,
}

impl<S: KVStorage> Table<S> {
    pub fn new(name: impl Into<String>, storage: S) -> Self {
        let name = name.into();
        Self {
            storage: NamespacedStorage::new(format!("{name}/"), storage),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_item(&self, id: &str) -> Result<Option<Item>, TableError> {
        let value = match self.storage.get(id.as_bytes())? {
            Some(v) => v,
            None => {
                debug!(table = %self.name, id, "item not found");
                return Ok(None);
            }
        };

        serde_json::from_slice(&value)
            .map(Some)
            .map_err(|err| TableError::Decode { reason: format!("item {id:?} in table {:?}: {err}", self.name) })
    }

    /// Replaces the whole item stored under its key attribute.
    pub fn put_item(&self, item: &Item) -> Result<(), TableError> {
        let id = item.string(KEY_ATTRIBUTE)
            .ok_or(TableError::MissingKey { attribute: KEY_ATTRIBUTE })?;
        let value = serde_json::to_vec(item)
            .map_err(|err| TableError::Encode { reason: err.to_string() })?;

        self.storage.set(id.as_bytes(), &value)?;
        Ok(())
    }
}
