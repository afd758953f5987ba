//! Sink implementations
//!
//! Contains LogSink, FileSink, NetworkSink and MemorySink. Each one turns the
//! replica operations into a [`SinkCall`](crate::SinkCall) and handles it in
//! its own `apply`.

mod file;
mod log;
mod memory;
mod network;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::network::{NetworkFormat, NetworkSink, NetworkSinkConfig};

/// Implement `ReplicaSink` for a type with a `name: String` field and an
/// `async fn apply(&self, call: SinkCall) -> Result<(), ContractError>`.
macro_rules! impl_replica_sink {
    ($sink:ty) => {
        impl contracts::ReplicaSink for $sink {
            fn name(&self) -> &str {
                &self.name
            }

            async fn insert(
                &self,
                collection: &str,
                partition: &str,
                id: i64,
                vector: &[f32],
            ) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::Insert {
                    collection: collection.to_string(),
                    partition: partition.to_string(),
                    id,
                    vector: vector.to_vec(),
                })
                .await
            }

            async fn delete(
                &self,
                collection: &str,
                partition: &str,
                id: i64,
            ) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::Delete {
                    collection: collection.to_string(),
                    partition: partition.to_string(),
                    id,
                })
                .await
            }

            async fn create_collection(
                &self,
                collection: &str,
                dimension: i64,
                index_file_size: i64,
                metric_type: i32,
            ) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::CreateCollection {
                    collection: collection.to_string(),
                    dimension,
                    index_file_size,
                    metric_type,
                })
                .await
            }

            async fn drop_collection(
                &self,
                collection: &str,
            ) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::DropCollection {
                    collection: collection.to_string(),
                })
                .await
            }

            async fn create_partition(
                &self,
                collection: &str,
                partition: &str,
            ) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::CreatePartition {
                    collection: collection.to_string(),
                    partition: partition.to_string(),
                })
                .await
            }

            async fn drop_partition(
                &self,
                collection: &str,
                partition: &str,
            ) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::DropPartition {
                    collection: collection.to_string(),
                    partition: partition.to_string(),
                })
                .await
            }

            async fn create_index(
                &self,
                collection: &str,
                index_type: i64,
                extra_params: &str,
            ) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::CreateIndex {
                    collection: collection.to_string(),
                    index_type,
                    extra_params: extra_params.to_string(),
                })
                .await
            }

            async fn drop_index(&self, collection: &str) -> Result<(), contracts::ContractError> {
                self.apply($crate::SinkCall::DropIndex {
                    collection: collection.to_string(),
                })
                .await
            }
        }
    };
}

pub(crate) use impl_replica_sink;

impl_replica_sink!(LogSink);
impl_replica_sink!(FileSink);
impl_replica_sink!(NetworkSink);
impl_replica_sink!(MemorySink);
