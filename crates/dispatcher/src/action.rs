//! Action dispatch - one record, one replica, exactly one operation

use contracts::{Action, ContractError, IndexParams, MutationRecord, ReplicaSink};

/// Apply `record` to `sink`.
///
/// Performs exactly the operation implied by `record.action`. Sink errors are
/// returned unchanged; nothing is retried.
pub async fn dispatch<S: ReplicaSink + Sync>(
    sink: &S,
    record: &MutationRecord,
) -> Result<(), ContractError> {
    let collection = record.collection_name.as_str();
    let partition = record.partition_tag.as_str();

    match record.action {
        Action::Insert => {
            sink.insert(collection, partition, record.id, &record.vector)
                .await
        }
        Action::Delete => sink.delete(collection, partition, record.id).await,
        Action::CreateCollection => {
            sink.create_collection(
                collection,
                record.dimension,
                record.index_file_size,
                record.metric_type,
            )
            .await
        }
        Action::DropCollection => sink.drop_collection(collection).await,
        Action::CreatePartition => sink.create_partition(collection, partition).await,
        Action::DropPartition => sink.drop_partition(collection, partition).await,
        Action::CreateIndex => {
            // No params on the record means no tuning, not a zero nlist
            let extra_params = record
                .index_params
                .as_ref()
                .map(IndexParams::extra_params)
                .unwrap_or_default();
            sink.create_index(collection, record.index_type, &extra_params)
                .await
        }
        Action::DropIndex => sink.drop_index(collection).await,
    }
}
