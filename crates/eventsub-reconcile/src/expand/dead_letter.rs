use eventsub_config::FlatConfig;
use eventsub_core::model::{DeadLetterDestination, StorageBlobDeadLetterDestination};

/// Returns the dead-letter destination, if one is configured.
pub fn expand_dead_letter(config: &FlatConfig) -> Option<DeadLetterDestination> {
    let block = config.storage_blob_dead_letter_destination.as_ref()?;
    Some(DeadLetterDestination::StorageBlob(
        StorageBlobDeadLetterDestination {
            resource_id: block.storage_account_id.clone(),
            blob_container_name: block.storage_blob_container_name.clone(),
        },
    ))
}
