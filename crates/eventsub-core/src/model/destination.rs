//! Delivery destinations.

use serde::{Deserialize, Serialize};

/// Where matching events are delivered.
///
/// Serialised as `{"endpointType": "...", "properties": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "endpointType", content = "properties")]
pub enum Destination {
    AzureFunction(AzureFunctionDestination),
    EventHub(ResourceDestination),
    HybridConnection(ResourceDestination),
    ServiceBusQueue(ResourceDestination),
    ServiceBusTopic(ResourceDestination),
    StorageQueue(StorageQueueDestination),
    WebHook(WebHookDestination),
}

impl Destination {
    pub fn endpoint_type(&self) -> &'static str {
        match self {
            Self::AzureFunction(_) => "AzureFunction",
            Self::EventHub(_) => "EventHub",
            Self::HybridConnection(_) => "HybridConnection",
            Self::ServiceBusQueue(_) => "ServiceBusQueue",
            Self::ServiceBusTopic(_) => "ServiceBusTopic",
            Self::StorageQueue(_) => "StorageQueue",
            Self::WebHook(_) => "WebHook",
        }
    }

    pub fn as_webhook(&self) -> Option<&WebHookDestination> {
        match self {
            Self::WebHook(webhook) => Some(webhook),
            _ => None,
        }
    }

    pub fn is_webhook(&self) -> bool {
        self.as_webhook().is_some()
    }
}

/// Destinations addressed purely by a resource ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDestination {
    pub resource_id: String,
}

impl ResourceDestination {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureFunctionDestination {
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_events_per_batch: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_batch_size_in_kilobytes: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQueueDestination {
    /// Storage account resource ID.
    pub resource_id: String,
    pub queue_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_message_time_to_live_in_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebHookDestination {
    /// Write-only: the service never returns it. Use the full URL call instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Computed by the service: the endpoint URL without its query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_events_per_batch: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_batch_size_in_kilobytes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_active_directory_tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_active_directory_application_id_or_uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_destination_wire_shape() {
        let destination = Destination::ServiceBusQueue(ResourceDestination::new("/queues/q1"));
        assert_eq!(
            serde_json::to_value(&destination).unwrap(),
            json!({"endpointType": "ServiceBusQueue", "properties": {"resourceId": "/queues/q1"}})
        );
    }

    #[test]
    fn test_webhook_deserialize_without_url() {
        let destination: Destination = serde_json::from_value(json!({
            "endpointType": "WebHook",
            "properties": {"endpointBaseUrl": "https://example.com/hook"}
        }))
        .unwrap();
        let webhook = destination.as_webhook().unwrap();
        assert!(webhook.endpoint_url.is_none());
        assert_eq!(
            webhook.endpoint_base_url.as_deref(),
            Some("https://example.com/hook")
        );
        assert_eq!(destination.endpoint_type(), "WebHook");
    }
}
