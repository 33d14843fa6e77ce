//! The flat configuration surface of one event subscription.
//!
//! Every polymorphic part of the remote payload shows up here as a set of
//! optional sibling fields. Empty strings count as unset.

use serde::{Deserialize, Serialize};

use eventsub_core::model::{AdvancedFilterOperator, EventDeliverySchema};
use eventsub_core::{EventSubscriptionId, ResourceKind, ValidationError};

use crate::schema::DESTINATION_FIELDS;

/// Desired state of an event subscription, as written by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlatConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(default)]
    pub event_delivery_schema: EventDeliverySchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time_utc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_function_endpoint: Option<AzureFunctionEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eventhub_endpoint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid_connection_endpoint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_bus_queue_endpoint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_bus_topic_endpoint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_queue_endpoint: Option<StorageQueueEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_endpoint: Option<WebhookEndpoint>,

    /// Empty means all event types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_event_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_filter: Option<SubjectFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advanced_filter: Vec<AdvancedFilterEntry>,
    #[serde(default)]
    pub advanced_filtering_on_arrays_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_identity: Option<IdentityBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_letter_identity: Option<IdentityBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_blob_dead_letter_destination: Option<StorageBlobDeadLetterBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicyBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AzureFunctionEndpoint {
    pub function_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_events_per_batch: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_batch_size_in_kilobytes: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageQueueEndpoint {
    pub storage_account_id: String,
    pub queue_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_message_time_to_live_in_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookEndpoint {
    pub url: String,
    /// Computed by the service; ignored on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_events_per_batch: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_batch_size_in_kilobytes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_directory_tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_directory_app_id_or_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubjectFilter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject_begins_with: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject_ends_with: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl SubjectFilter {
    pub fn is_empty(&self) -> bool {
        self.subject_begins_with.is_empty() && self.subject_ends_with.is_empty() && !self.case_sensitive
    }
}

/// One `{operator, key, values}` entry. The operator decides how many
/// values are allowed and of which type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvancedFilterEntry {
    pub operator: AdvancedFilterOperator,
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<FilterValue>,
}

impl AdvancedFilterEntry {
    pub fn new(operator: AdvancedFilterOperator, key: impl Into<String>) -> Self {
        Self {
            operator,
            key: key.into(),
            values: Vec::new(),
        }
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = FilterValue>) -> Self {
        self.values.extend(values);
        self
    }
}

/// A single advanced filter operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl FilterValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityType {
    SystemAssigned,
    UserAssigned,
}

impl IdentityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAssigned => "SystemAssigned",
            Self::UserAssigned => "UserAssigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityBlock {
    #[serde(rename = "type")]
    pub identity_type: IdentityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_assigned_identity: Option<String>,
}

impl IdentityBlock {
    pub fn system_assigned() -> Self {
        Self {
            identity_type: IdentityType::SystemAssigned,
            user_assigned_identity: None,
        }
    }

    pub fn user_assigned(identity: impl Into<String>) -> Self {
        Self {
            identity_type: IdentityType::UserAssigned,
            user_assigned_identity: Some(identity.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageBlobDeadLetterBlock {
    pub storage_account_id: String,
    pub storage_blob_container_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicyBlock {
    pub max_delivery_attempts: i32,
    /// Minutes.
    pub event_time_to_live: i32,
}

pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl FlatConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the named destination field is populated.
    pub fn is_destination_set(&self, field: &str) -> bool {
        match field {
            "azure_function_endpoint" => self.azure_function_endpoint.is_some(),
            "eventhub_endpoint_id" => is_set(&self.eventhub_endpoint_id),
            "hybrid_connection_endpoint_id" => is_set(&self.hybrid_connection_endpoint_id),
            "service_bus_queue_endpoint_id" => is_set(&self.service_bus_queue_endpoint_id),
            "service_bus_topic_endpoint_id" => is_set(&self.service_bus_topic_endpoint_id),
            "storage_queue_endpoint" => self.storage_queue_endpoint.is_some(),
            "webhook_endpoint" => self.webhook_endpoint.is_some(),
            _ => false,
        }
    }

    /// Populated destination fields, in priority order.
    pub fn destination_fields_set(&self) -> Vec<&'static str> {
        DESTINATION_FIELDS
            .into_iter()
            .filter(|field| self.is_destination_set(field))
            .collect()
    }

    /// Builds the identifier this configuration addresses.
    pub fn target_id(
        &self,
        kind: ResourceKind,
        subscription_id: &str,
    ) -> Result<EventSubscriptionId, ValidationError> {
        match kind {
            ResourceKind::SystemTopicEventSubscription => {
                let resource_group = required(&self.resource_group_name, "resource_group_name")?;
                let system_topic = required(&self.system_topic, "system_topic")?;
                if subscription_id.is_empty() {
                    return Err(ValidationError::new(
                        "subscription_id",
                        "is required to address a system topic",
                    ));
                }
                Ok(EventSubscriptionId::system_topic(
                    subscription_id,
                    resource_group,
                    system_topic,
                    &self.name,
                ))
            }
            ResourceKind::EventSubscription => {
                let scope = required(&self.scope, "scope")?;
                Ok(EventSubscriptionId::scoped(scope, &self.name))
            }
        }
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::new(field, "is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_fields_in_priority_order() {
        let mut config = FlatConfig::new("sub");
        config.webhook_endpoint = Some(WebhookEndpoint {
            url: "https://example.com/hook".into(),
            ..Default::default()
        });
        config.eventhub_endpoint_id = Some("/subscriptions/1/eh".into());
        config.service_bus_queue_endpoint_id = Some(String::new());

        assert_eq!(
            config.destination_fields_set(),
            vec!["eventhub_endpoint_id", "webhook_endpoint"]
        );
    }

    #[test]
    fn test_target_id_per_kind() {
        let mut config = FlatConfig::new("sub1");
        config.system_topic = Some("topic1".into());
        config.resource_group_name = Some("rg1".into());
        let id = config
            .target_id(ResourceKind::SystemTopicEventSubscription, "0000")
            .unwrap();
        assert_eq!(
            id.to_string(),
            "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.EventGrid/systemTopics/topic1/eventSubscriptions/sub1"
        );

        let err = config
            .target_id(ResourceKind::EventSubscription, "0000")
            .unwrap_err();
        assert_eq!(err.field, "scope");
    }

    #[test]
    fn test_subject_filter_emptiness() {
        assert!(SubjectFilter::default().is_empty());
        let filter = SubjectFilter {
            case_sensitive: true,
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }
}
