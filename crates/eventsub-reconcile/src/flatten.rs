//! Remote model back to the flat configuration.
//!
//! Flattening is total: absent remote parts become empty fields, never
//! errors. Exactly one flat destination field is populated when the remote
//! payload has a destination.

use eventsub_config::{
    AdvancedFilterEntry, AzureFunctionEndpoint, FilterValue, FlatConfig, IdentityBlock,
    RetryPolicyBlock, StorageBlobDeadLetterBlock, StorageQueueEndpoint, SubjectFilter,
    WebhookEndpoint,
};
use eventsub_core::model::{
    AdvancedFilter, DeadLetterDestination, Destination, Filter, Placement, ResourceIdentity,
    SubscriptionProperties,
};
use eventsub_core::{EventSubscriptionId, SubscriptionScope, format_rfc3339};

/// Reconstructs the flat configuration of the subscription `id`.
///
/// `full_url` is the webhook delivery URL fetched separately; the stored
/// payload only carries its base.
pub fn flatten_subscription(
    id: &EventSubscriptionId,
    properties: &SubscriptionProperties,
    name: &str,
    full_url: Option<&str>,
) -> FlatConfig {
    let mut config = FlatConfig::new(name);

    match &id.scope {
        SubscriptionScope::SystemTopic {
            resource_group,
            system_topic,
            ..
        } => {
            config.system_topic = Some(system_topic.clone());
            config.resource_group_name = Some(resource_group.clone());
        }
        SubscriptionScope::Scope(scope) => config.scope = Some(scope.clone()),
    }

    if let Some(placement) = &properties.destination {
        config.delivery_identity = flatten_identity(placement.identity());
        flatten_destination(&mut config, placement.inner(), full_url);
    }

    if let Some(placement) = &properties.dead_letter {
        config.dead_letter_identity = flatten_identity(placement.identity());
        flatten_dead_letter(&mut config, placement);
    }

    if let Some(filter) = &properties.filter {
        flatten_filter(&mut config, filter);
    }

    config.retry_policy = properties.retry_policy.map(|retry| RetryPolicyBlock {
        max_delivery_attempts: retry.max_delivery_attempts,
        event_time_to_live: retry.event_time_to_live_in_minutes,
    });
    config.labels = properties.labels.clone();
    config.event_delivery_schema = properties.event_delivery_schema.unwrap_or_default();
    config.expiration_time_utc = properties
        .expiration_time_utc
        .and_then(|expiration| format_rfc3339(expiration).ok());

    config
}

fn flatten_destination(config: &mut FlatConfig, destination: &Destination, full_url: Option<&str>) {
    match destination {
        Destination::AzureFunction(function) => {
            config.azure_function_endpoint = Some(AzureFunctionEndpoint {
                function_id: function.resource_id.clone(),
                max_events_per_batch: function.max_events_per_batch,
                preferred_batch_size_in_kilobytes: function.preferred_batch_size_in_kilobytes,
            });
        }
        Destination::EventHub(hub) => config.eventhub_endpoint_id = Some(hub.resource_id.clone()),
        Destination::HybridConnection(connection) => {
            config.hybrid_connection_endpoint_id = Some(connection.resource_id.clone());
        }
        Destination::ServiceBusQueue(queue) => {
            config.service_bus_queue_endpoint_id = Some(queue.resource_id.clone());
        }
        Destination::ServiceBusTopic(topic) => {
            config.service_bus_topic_endpoint_id = Some(topic.resource_id.clone());
        }
        Destination::StorageQueue(queue) => {
            config.storage_queue_endpoint = Some(StorageQueueEndpoint {
                storage_account_id: queue.resource_id.clone(),
                queue_name: queue.queue_name.clone(),
                queue_message_time_to_live_in_seconds: queue.queue_message_time_to_live_in_seconds,
            });
        }
        Destination::WebHook(webhook) => {
            let url = full_url
                .map(str::to_string)
                .or_else(|| webhook.endpoint_url.clone())
                .unwrap_or_default();
            config.webhook_endpoint = Some(WebhookEndpoint {
                url,
                base_url: webhook.endpoint_base_url.clone(),
                max_events_per_batch: webhook.max_events_per_batch,
                preferred_batch_size_in_kilobytes: webhook.preferred_batch_size_in_kilobytes,
                active_directory_tenant_id: webhook.azure_active_directory_tenant_id.clone(),
                active_directory_app_id_or_uri: webhook
                    .azure_active_directory_application_id_or_uri
                    .clone(),
            });
        }
    }
}

fn flatten_dead_letter(config: &mut FlatConfig, placement: &Placement<DeadLetterDestination>) {
    match placement.inner() {
        DeadLetterDestination::StorageBlob(blob) => {
            config.storage_blob_dead_letter_destination = Some(StorageBlobDeadLetterBlock {
                storage_account_id: blob.resource_id.clone(),
                storage_blob_container_name: blob.blob_container_name.clone(),
            });
        }
    }
}

fn flatten_identity(identity: Option<&ResourceIdentity>) -> Option<IdentityBlock> {
    match identity? {
        ResourceIdentity::SystemAssigned => Some(IdentityBlock::system_assigned()),
        ResourceIdentity::UserAssigned {
            user_assigned_identity,
        } => Some(IdentityBlock::user_assigned(user_assigned_identity.clone())),
        ResourceIdentity::None => None,
    }
}

fn flatten_filter(config: &mut FlatConfig, filter: &Filter) {
    config.included_event_types = filter.included_event_types.clone().unwrap_or_default();
    config.advanced_filtering_on_arrays_enabled =
        filter.enable_advanced_filtering_on_arrays.unwrap_or(false);

    let subject = SubjectFilter {
        subject_begins_with: filter.subject_begins_with.clone().unwrap_or_default(),
        subject_ends_with: filter.subject_ends_with.clone().unwrap_or_default(),
        case_sensitive: filter.is_subject_case_sensitive.unwrap_or(false),
    };
    config.subject_filter = (!subject.is_empty()).then_some(subject);

    config.advanced_filter = filter.advanced_filters.iter().map(flatten_advanced_filter).collect();
}

fn flatten_advanced_filter(filter: &AdvancedFilter) -> AdvancedFilterEntry {
    let values: Vec<FilterValue> = match filter {
        AdvancedFilter::NumberIn { values, .. } | AdvancedFilter::NumberNotIn { values, .. } => {
            values.iter().copied().map(FilterValue::Number).collect()
        }
        AdvancedFilter::NumberLessThan { value, .. }
        | AdvancedFilter::NumberGreaterThan { value, .. }
        | AdvancedFilter::NumberLessThanOrEquals { value, .. }
        | AdvancedFilter::NumberGreaterThanOrEquals { value, .. } => {
            vec![FilterValue::Number(*value)]
        }
        AdvancedFilter::NumberInRange { values, .. }
        | AdvancedFilter::NumberNotInRange { values, .. } => values
            .iter()
            .flat_map(|[low, high]| [FilterValue::Number(*low), FilterValue::Number(*high)])
            .collect(),
        AdvancedFilter::StringContains { values, .. }
        | AdvancedFilter::StringNotContains { values, .. }
        | AdvancedFilter::StringBeginsWith { values, .. }
        | AdvancedFilter::StringNotBeginsWith { values, .. }
        | AdvancedFilter::StringEndsWith { values, .. }
        | AdvancedFilter::StringNotEndsWith { values, .. }
        | AdvancedFilter::StringIn { values, .. }
        | AdvancedFilter::StringNotIn { values, .. } => {
            values.iter().cloned().map(FilterValue::String).collect()
        }
        AdvancedFilter::BoolEquals { value, .. } => vec![FilterValue::Bool(*value)],
        AdvancedFilter::IsNullOrUndefined { .. } | AdvancedFilter::IsNotNull { .. } => Vec::new(),
    };

    AdvancedFilterEntry::new(filter.operator(), filter.key()).with_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventsub_core::model::{
        ResourceDestination, StorageBlobDeadLetterDestination, WebHookDestination,
        WithResourceIdentity,
    };

    fn system_topic_id() -> EventSubscriptionId {
        EventSubscriptionId::system_topic("0000", "rg1", "topic1", "sub1")
    }

    #[test]
    fn test_empty_properties_flatten_to_empty_config() {
        let config = flatten_subscription(
            &system_topic_id(),
            &SubscriptionProperties::default(),
            "sub1",
            None,
        );
        assert_eq!(config.name, "sub1");
        assert_eq!(config.system_topic.as_deref(), Some("topic1"));
        assert_eq!(config.resource_group_name.as_deref(), Some("rg1"));
        assert!(config.destination_fields_set().is_empty());
        assert!(config.delivery_identity.is_none());
        assert!(config.subject_filter.is_none());
        assert!(config.expiration_time_utc.is_none());
    }

    #[test]
    fn test_webhook_url_prefers_fetched_full_url() {
        let properties = SubscriptionProperties {
            destination: Some(Placement::Direct(Destination::WebHook(WebHookDestination {
                endpoint_base_url: Some("https://example.com/api".into()),
                ..Default::default()
            }))),
            ..Default::default()
        };

        let config = flatten_subscription(
            &system_topic_id(),
            &properties,
            "sub1",
            Some("https://example.com/api?code=secret"),
        );
        let webhook = config.webhook_endpoint.unwrap();
        assert_eq!(webhook.url, "https://example.com/api?code=secret");
        assert_eq!(webhook.base_url.as_deref(), Some("https://example.com/api"));

        let config = flatten_subscription(&system_topic_id(), &properties, "sub1", None);
        assert_eq!(config.webhook_endpoint.unwrap().url, "");
    }

    #[test]
    fn test_envelope_identities_flatten_to_identity_fields() {
        let properties = SubscriptionProperties {
            destination: Some(Placement::WithIdentity(WithResourceIdentity {
                identity: ResourceIdentity::UserAssigned {
                    user_assigned_identity: "/id1".into(),
                },
                inner: Destination::EventHub(ResourceDestination::new("/eh")),
            })),
            dead_letter: Some(Placement::WithIdentity(WithResourceIdentity {
                identity: ResourceIdentity::None,
                inner: DeadLetterDestination::StorageBlob(StorageBlobDeadLetterDestination {
                    resource_id: "/sa".into(),
                    blob_container_name: "dl".into(),
                }),
            })),
            ..Default::default()
        };

        let config = flatten_subscription(&system_topic_id(), &properties, "sub1", None);
        assert_eq!(config.eventhub_endpoint_id.as_deref(), Some("/eh"));
        assert_eq!(config.delivery_identity, Some(IdentityBlock::user_assigned("/id1")));
        assert_eq!(config.dead_letter_identity, None);
        assert_eq!(
            config
                .storage_blob_dead_letter_destination
                .map(|d| d.storage_blob_container_name),
            Some("dl".to_string())
        );
    }

    #[test]
    fn test_range_filters_flatten_to_pairs() {
        let entry = flatten_advanced_filter(&AdvancedFilter::NumberInRange {
            key: "data.size".into(),
            values: vec![[1.0, 2.0], [10.0, 20.0]],
        });
        assert_eq!(entry.key, "data.size");
        assert_eq!(
            entry.values,
            vec![
                FilterValue::Number(1.0),
                FilterValue::Number(2.0),
                FilterValue::Number(10.0),
                FilterValue::Number(20.0),
            ]
        );
    }

    #[test]
    fn test_scoped_id_fills_scope() {
        let id = EventSubscriptionId::scoped("/subscriptions/0000/resourceGroups/rg1", "sub1");
        let config = flatten_subscription(&id, &SubscriptionProperties::default(), "sub1", None);
        assert_eq!(config.scope.as_deref(), Some("/subscriptions/0000/resourceGroups/rg1"));
        assert!(config.system_topic.is_none());
    }
}
