//! In-memory implementation of ResourceStore for tests, demos and seeded data

use crate::core::entity::Filterable;
use crate::core::error::StoreError;
use crate::core::service::ResourceStore;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// In-memory record store
///
/// Keeps seeding order, which is the order records come back in before any
/// sort is applied. Clones share the same records.
#[derive(Clone)]
pub struct InMemoryStore<T> {
    records: Arc<RwLock<Vec<T>>>,
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a store pre-filled with `records`
    pub fn seeded(records: impl IntoIterator<Item = T>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records.into_iter().collect())),
        }
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Filterable> ResourceStore<T> for InMemoryStore<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned("read"))?;

        Ok(records.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned("read"))?;

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        title: &'static str,
    }

    impl Filterable for Note {
        fn resource_name() -> &'static str {
            "notes"
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            (field == "title").then(|| self.title.into())
        }
    }

    #[tokio::test]
    async fn test_list_keeps_seeding_order() {
        let store = InMemoryStore::seeded([Note { title: "b" }, Note { title: "a" }]);

        let notes = store.list().await.unwrap();
        assert_eq!(notes, vec![Note { title: "b" }, Note { title: "a" }]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = InMemoryStore::seeded([Note { title: "first" }]);
        let clone = store.clone();
        assert_eq!(clone.list().await.unwrap(), store.list().await.unwrap());
        assert!(Arc::ptr_eq(&store.records, &clone.records));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store: InMemoryStore<Note> = InMemoryStore::default();
        assert!(store.list().await.unwrap().is_empty());
    }
}
