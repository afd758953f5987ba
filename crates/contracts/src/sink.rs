//! ReplicaSink trait - the mutation surface of one store replica
//!
//! Every operation may suspend and may fail. Implementations own their retry
//! and timeout policy; callers record failures and move on.

use std::sync::Arc;

use crate::ContractError;

/// Mutation operations exposed by one downstream replica.
///
/// All methods take `&self` so one sink can be driven from several
/// consumption loops at once.
#[trait_variant::make(ReplicaSink: Send)]
pub trait LocalReplicaSink {
    /// Replica name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Insert one vector under `id`
    async fn insert(
        &self,
        collection: &str,
        partition: &str,
        id: i64,
        vector: &[f32],
    ) -> Result<(), ContractError>;

    /// Delete the entity with `id`
    async fn delete(&self, collection: &str, partition: &str, id: i64)
        -> Result<(), ContractError>;

    async fn create_collection(
        &self,
        collection: &str,
        dimension: i64,
        index_file_size: i64,
        metric_type: i32,
    ) -> Result<(), ContractError>;

    async fn drop_collection(&self, collection: &str) -> Result<(), ContractError>;

    async fn create_partition(&self, collection: &str, partition: &str)
        -> Result<(), ContractError>;

    async fn drop_partition(&self, collection: &str, partition: &str)
        -> Result<(), ContractError>;

    /// `extra_params` is the store's index tuning JSON, e.g. `{"nlist":1024}`
    async fn create_index(
        &self,
        collection: &str,
        index_type: i64,
        extra_params: &str,
    ) -> Result<(), ContractError>;

    async fn drop_index(&self, collection: &str) -> Result<(), ContractError>;
}

// Shared ownership: the same replica can back several engines.
impl<T: ReplicaSink + Sync> ReplicaSink for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn insert(
        &self,
        collection: &str,
        partition: &str,
        id: i64,
        vector: &[f32],
    ) -> Result<(), ContractError> {
        (**self).insert(collection, partition, id, vector).await
    }

    async fn delete(
        &self,
        collection: &str,
        partition: &str,
        id: i64,
    ) -> Result<(), ContractError> {
        (**self).delete(collection, partition, id).await
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimension: i64,
        index_file_size: i64,
        metric_type: i32,
    ) -> Result<(), ContractError> {
        (**self)
            .create_collection(collection, dimension, index_file_size, metric_type)
            .await
    }

    async fn drop_collection(&self, collection: &str) -> Result<(), ContractError> {
        (**self).drop_collection(collection).await
    }

    async fn create_partition(
        &self,
        collection: &str,
        partition: &str,
    ) -> Result<(), ContractError> {
        (**self).create_partition(collection, partition).await
    }

    async fn drop_partition(&self, collection: &str, partition: &str) -> Result<(), ContractError> {
        (**self).drop_partition(collection, partition).await
    }

    async fn create_index(
        &self,
        collection: &str,
        index_type: i64,
        extra_params: &str,
    ) -> Result<(), ContractError> {
        (**self).create_index(collection, index_type, extra_params).await
    }

    async fn drop_index(&self, collection: &str) -> Result<(), ContractError> {
        (**self).drop_index(collection).await
    }
}
