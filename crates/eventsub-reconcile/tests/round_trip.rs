//! Flat configuration -> remote payload (through its JSON wire form) -> flat
//! configuration.

use eventsub_config::{
    AdvancedFilterEntry, AzureFunctionEndpoint, FilterValue, FlatConfig, IdentityBlock,
    RetryPolicyBlock, StorageBlobDeadLetterBlock, StorageQueueEndpoint, SubjectFilter,
    WebhookEndpoint,
};
use eventsub_core::EventSubscriptionId;
use eventsub_core::model::{AdvancedFilterOperator as Op, EventDeliverySchema, SubscriptionProperties};
use eventsub_reconcile::{assemble_properties, flatten_subscription};

fn base() -> FlatConfig {
    let mut config = FlatConfig::new("orders-sub");
    config.system_topic = Some("storage-events".into());
    config.resource_group_name = Some("rg1".into());
    config
}

fn id() -> EventSubscriptionId {
    EventSubscriptionId::system_topic("0000", "rg1", "storage-events", "orders-sub")
}

fn round_trip(config: &FlatConfig) -> FlatConfig {
    let properties = assemble_properties(config).expect("config should assemble");
    let wire = serde_json::to_value(&properties).expect("serialize");
    let read: SubscriptionProperties = serde_json::from_value(wire).expect("deserialize");
    flatten_subscription(&id(), &read, &config.name, None)
}

#[test]
fn resource_id_destinations_round_trip() {
    let setters: [fn(&mut FlatConfig, String); 4] = [
        |c, v| c.eventhub_endpoint_id = Some(v),
        |c, v| c.hybrid_connection_endpoint_id = Some(v),
        |c, v| c.service_bus_queue_endpoint_id = Some(v),
        |c, v| c.service_bus_topic_endpoint_id = Some(v),
    ];
    for set in setters {
        let mut config = base();
        set(&mut config, "/subscriptions/0000/resourceGroups/rg1/providers/X/y/z".into());
        assert_eq!(round_trip(&config), config);
    }
}

#[test]
fn azure_function_with_delivery_identity_and_retry_round_trips() {
    let mut config = base();
    config.azure_function_endpoint = Some(AzureFunctionEndpoint {
        function_id: "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/app/functions/fn".into(),
        max_events_per_batch: Some(50),
        preferred_batch_size_in_kilobytes: Some(256),
    });
    config.delivery_identity = Some(IdentityBlock::system_assigned());
    config.retry_policy = Some(RetryPolicyBlock {
        max_delivery_attempts: 10,
        event_time_to_live: 120,
    });
    config.event_delivery_schema = EventDeliverySchema::CloudEventSchemaV1_0;

    assert_eq!(round_trip(&config), config);
}

#[test]
fn storage_queue_with_dead_letter_identity_round_trips() {
    let mut config = base();
    config.storage_queue_endpoint = Some(StorageQueueEndpoint {
        storage_account_id: "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/sa".into(),
        queue_name: "events".into(),
        queue_message_time_to_live_in_seconds: Some(-1),
    });
    config.storage_blob_dead_letter_destination = Some(StorageBlobDeadLetterBlock {
        storage_account_id: "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/dl".into(),
        storage_blob_container_name: "deadletters".into(),
    });
    config.dead_letter_identity = Some(IdentityBlock::user_assigned(
        "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id1",
    ));
    config.expiration_time_utc = Some("2030-06-01T12:00:00Z".into());
    config.labels = vec!["team-a".into(), "orders".into()];

    assert_eq!(round_trip(&config), config);
}

#[test]
fn webhook_with_filters_round_trips() {
    let mut config = base();
    config.webhook_endpoint = Some(WebhookEndpoint {
        url: "https://example.com/api?code=secret".into(),
        max_events_per_batch: Some(10),
        preferred_batch_size_in_kilobytes: Some(64),
        active_directory_tenant_id: Some("tenant".into()),
        active_directory_app_id_or_uri: Some("api://app".into()),
        ..Default::default()
    });
    config.included_event_types = vec![
        "Microsoft.Storage.BlobCreated".into(),
        "Microsoft.Storage.BlobDeleted".into(),
    ];
    config.subject_filter = Some(SubjectFilter {
        subject_begins_with: "/blobServices/default/containers/images".into(),
        subject_ends_with: ".png".into(),
        case_sensitive: true,
    });
    config.advanced_filtering_on_arrays_enabled = true;
    config.advanced_filter = vec![
        AdvancedFilterEntry::new(Op::NumberInRange, "data.contentLength")
            .with_values([0.0, 1024.0, 4096.0, 8192.0].map(FilterValue::Number)),
        AdvancedFilterEntry::new(Op::StringIn, "data.api").with_values([FilterValue::from("PutBlob")]),
        AdvancedFilterEntry::new(Op::BoolEquals, "data.isFolder").with_values([FilterValue::Bool(false)]),
        AdvancedFilterEntry::new(Op::NumberLessThanOrEquals, "data.tier").with_values([FilterValue::Number(3.0)]),
        AdvancedFilterEntry::new(Op::IsNullOrUndefined, "data.deletedAt"),
    ];

    assert_eq!(round_trip(&config), config);
}

#[test]
fn expiration_is_canonicalised_to_utc() {
    let mut config = base();
    config.eventhub_endpoint_id = Some("/eh".into());
    config.expiration_time_utc = Some("2030-06-01T14:00:00.500+02:00".into());

    let flattened = round_trip(&config);
    assert_eq!(
        flattened.expiration_time_utc.as_deref(),
        Some("2030-06-01T12:00:00Z")
    );
}
