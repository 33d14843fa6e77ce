use serde::{Deserialize, Serialize};

/// Where undeliverable events are parked once retries are exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "endpointType", content = "properties")]
pub enum DeadLetterDestination {
    StorageBlob(StorageBlobDeadLetterDestination),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBlobDeadLetterDestination {
    /// Storage account resource ID.
    pub resource_id: String,
    pub blob_container_name: String,
}
