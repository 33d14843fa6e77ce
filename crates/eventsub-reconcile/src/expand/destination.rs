use eventsub_config::FlatConfig;
use eventsub_core::model::{
    AzureFunctionDestination, Destination, ResourceDestination, StorageQueueDestination,
    WebHookDestination,
};

type DestinationExpander = fn(&FlatConfig) -> Option<Destination>;

/// Destination fields in the order they are tried. Keep in sync with
/// [`eventsub_config::DESTINATION_FIELDS`].
pub const DESTINATION_PRIORITY: [(&str, DestinationExpander); 7] = [
    ("azure_function_endpoint", azure_function),
    ("eventhub_endpoint_id", eventhub),
    ("hybrid_connection_endpoint_id", hybrid_connection),
    ("service_bus_queue_endpoint_id", service_bus_queue),
    ("service_bus_topic_endpoint_id", service_bus_topic),
    ("storage_queue_endpoint", storage_queue),
    ("webhook_endpoint", webhook),
];

/// Returns the destination of the first populated destination field, or
/// `None` when no destination is configured.
pub fn expand_destination(config: &FlatConfig) -> Option<Destination> {
    DESTINATION_PRIORITY
        .iter()
        .find_map(|(_, expand)| expand(config))
}

fn resource_id(value: &Option<String>) -> Option<ResourceDestination> {
    value
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(ResourceDestination::new)
}

fn azure_function(config: &FlatConfig) -> Option<Destination> {
    let endpoint = config.azure_function_endpoint.as_ref()?;
    Some(Destination::AzureFunction(AzureFunctionDestination {
        resource_id: endpoint.function_id.clone(),
        max_events_per_batch: endpoint.max_events_per_batch,
        preferred_batch_size_in_kilobytes: endpoint.preferred_batch_size_in_kilobytes,
    }))
}

fn eventhub(config: &FlatConfig) -> Option<Destination> {
    resource_id(&config.eventhub_endpoint_id).map(Destination::EventHub)
}

fn hybrid_connection(config: &FlatConfig) -> Option<Destination> {
    resource_id(&config.hybrid_connection_endpoint_id).map(Destination::HybridConnection)
}

fn service_bus_queue(config: &FlatConfig) -> Option<Destination> {
    resource_id(&config.service_bus_queue_endpoint_id).map(Destination::ServiceBusQueue)
}

fn service_bus_topic(config: &FlatConfig) -> Option<Destination> {
    resource_id(&config.service_bus_topic_endpoint_id).map(Destination::ServiceBusTopic)
}

fn storage_queue(config: &FlatConfig) -> Option<Destination> {
    let endpoint = config.storage_queue_endpoint.as_ref()?;
    Some(Destination::StorageQueue(StorageQueueDestination {
        resource_id: endpoint.storage_account_id.clone(),
        queue_name: endpoint.queue_name.clone(),
        queue_message_time_to_live_in_seconds: endpoint.queue_message_time_to_live_in_seconds,
    }))
}

fn webhook(config: &FlatConfig) -> Option<Destination> {
    let endpoint = config.webhook_endpoint.as_ref()?;
    Some(Destination::WebHook(WebHookDestination {
        endpoint_url: Some(endpoint.url.clone()),
        // Computed by the service.
        endpoint_base_url: None,
        max_events_per_batch: endpoint.max_events_per_batch,
        preferred_batch_size_in_kilobytes: endpoint.preferred_batch_size_in_kilobytes,
        azure_active_directory_tenant_id: non_empty(&endpoint.active_directory_tenant_id),
        azure_active_directory_application_id_or_uri: non_empty(
            &endpoint.active_directory_app_id_or_uri,
        ),
    }))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}
