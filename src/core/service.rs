//! Store trait list endpoints read records from

use crate::core::entity::Filterable;
use crate::core::error::StoreError;
use async_trait::async_trait;

/// Source of records for one list resource
///
/// List endpoints only read; search, filtering, sorting and windowing are done
/// by the query engine on whatever the store returns, so a store can be as
/// simple as a vector behind a lock.
#[async_trait]
pub trait ResourceStore<T: Filterable>: Send + Sync {
    /// All records of the resource, in storage order
    async fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Number of stored records
    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list().await?.len())
    }
}
