//! The top-level subscription payload.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::dead_letter::DeadLetterDestination;
use super::destination::Destination;
use super::filter::Filter;
use super::identity::{Placement, ResourceIdentity, WithResourceIdentity};

/// Schema events are delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventDeliverySchema {
    #[default]
    EventGridSchema,
    CloudEventSchemaV1_0,
    CustomInputSchema,
}

impl EventDeliverySchema {
    pub const ALL: [Self; 3] = [
        Self::EventGridSchema,
        Self::CloudEventSchemaV1_0,
        Self::CustomInputSchema,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventGridSchema => "EventGridSchema",
            Self::CloudEventSchemaV1_0 => "CloudEventSchemaV1_0",
            Self::CustomInputSchema => "CustomInputSchema",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_delivery_attempts: i32,
    pub event_time_to_live_in_minutes: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Creating,
    Updating,
    Deleting,
    Succeeded,
    Canceled,
    Failed,
    AwaitingManualAction,
    #[serde(other)]
    Unknown,
}

/// Remote write/read payload of an event subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireProperties", into = "WireProperties")]
pub struct SubscriptionProperties {
    pub destination: Option<Placement<Destination>>,
    pub dead_letter: Option<Placement<DeadLetterDestination>>,
    pub filter: Option<Filter>,
    pub retry_policy: Option<RetryPolicy>,
    pub labels: Vec<String>,
    pub event_delivery_schema: Option<EventDeliverySchema>,
    pub expiration_time_utc: Option<OffsetDateTime>,
    /// Read-only, set by the service.
    pub provisioning_state: Option<ProvisioningState>,
    /// Read-only, set by the service.
    pub topic: Option<String>,
}

impl SubscriptionProperties {
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref().map(Placement::inner)
    }

    pub fn dead_letter_destination(&self) -> Option<&DeadLetterDestination> {
        self.dead_letter.as_ref().map(Placement::inner)
    }
}

/// Remote resource envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SubscriptionProperties>,
}

impl EventSubscription {
    pub fn from_properties(properties: SubscriptionProperties) -> Self {
        Self {
            properties: Some(properties),
            ..Default::default()
        }
    }
}

// Wire shape: the identity envelopes are separate sibling fields.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryWithResourceIdentity {
    identity: ResourceIdentity,
    destination: Destination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeadLetterWithResourceIdentity {
    identity: ResourceIdentity,
    dead_letter_destination: DeadLetterDestination,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    destination: Option<Destination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_with_resource_identity: Option<DeliveryWithResourceIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dead_letter_destination: Option<DeadLetterDestination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dead_letter_with_resource_identity: Option<DeadLetterWithResourceIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry_policy: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_delivery_schema: Option<EventDeliverySchema>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    expiration_time_utc: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provisioning_state: Option<ProvisioningState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
}

impl From<WireProperties> for SubscriptionProperties {
    fn from(wire: WireProperties) -> Self {
        // The envelope wins when a drifted payload carries both shapes.
        let destination = match (wire.delivery_with_resource_identity, wire.destination) {
            (Some(wrapped), _) => Some(Placement::WithIdentity(WithResourceIdentity {
                identity: wrapped.identity,
                inner: wrapped.destination,
            })),
            (None, Some(destination)) => Some(Placement::Direct(destination)),
            (None, None) => None,
        };
        let dead_letter = match (
            wire.dead_letter_with_resource_identity,
            wire.dead_letter_destination,
        ) {
            (Some(wrapped), _) => Some(Placement::WithIdentity(WithResourceIdentity {
                identity: wrapped.identity,
                inner: wrapped.dead_letter_destination,
            })),
            (None, Some(destination)) => Some(Placement::Direct(destination)),
            (None, None) => None,
        };

        Self {
            destination,
            dead_letter,
            filter: wire.filter,
            retry_policy: wire.retry_policy,
            labels: wire.labels.unwrap_or_default(),
            event_delivery_schema: wire.event_delivery_schema,
            expiration_time_utc: wire.expiration_time_utc,
            provisioning_state: wire.provisioning_state,
            topic: wire.topic,
        }
    }
}

impl From<SubscriptionProperties> for WireProperties {
    fn from(props: SubscriptionProperties) -> Self {
        let mut wire = WireProperties {
            filter: props.filter,
            retry_policy: props.retry_policy,
            labels: (!props.labels.is_empty()).then_some(props.labels),
            event_delivery_schema: props.event_delivery_schema,
            expiration_time_utc: props.expiration_time_utc,
            provisioning_state: props.provisioning_state,
            topic: props.topic,
            ..Default::default()
        };

        match props.destination {
            Some(Placement::Direct(destination)) => wire.destination = Some(destination),
            Some(Placement::WithIdentity(wrapped)) => {
                wire.delivery_with_resource_identity = Some(DeliveryWithResourceIdentity {
                    identity: wrapped.identity,
                    destination: wrapped.inner,
                })
            }
            None => {}
        }
        match props.dead_letter {
            Some(Placement::Direct(destination)) => wire.dead_letter_destination = Some(destination),
            Some(Placement::WithIdentity(wrapped)) => {
                wire.dead_letter_with_resource_identity = Some(DeadLetterWithResourceIdentity {
                    identity: wrapped.identity,
                    dead_letter_destination: wrapped.inner,
                })
            }
            None => {}
        }

        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceDestination, StorageBlobDeadLetterDestination};
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn test_identity_envelope_serializes_as_sibling_field() {
        let props = SubscriptionProperties {
            destination: Some(Placement::new(
                Destination::EventHub(ResourceDestination::new("/hubs/h1")),
                Some(ResourceIdentity::SystemAssigned),
            )),
            dead_letter: Some(Placement::new(
                DeadLetterDestination::StorageBlob(StorageBlobDeadLetterDestination {
                    resource_id: "/accounts/a1".to_string(),
                    blob_container_name: "dlq".to_string(),
                }),
                None,
            )),
            expiration_time_utc: Some(datetime!(2030-01-01 00:00:00 UTC)),
            ..Default::default()
        };

        let value = serde_json::to_value(&props).unwrap();
        assert!(value.get("destination").is_none());
        assert_eq!(
            value["deliveryWithResourceIdentity"]["identity"],
            json!({"type": "SystemAssigned"})
        );
        assert_eq!(
            value["deliveryWithResourceIdentity"]["destination"]["endpointType"],
            "EventHub"
        );
        assert_eq!(value["deadLetterDestination"]["endpointType"], "StorageBlob");
        assert!(value.get("deadLetterWithResourceIdentity").is_none());
        assert_eq!(value["expirationTimeUtc"], "2030-01-01T00:00:00Z");

        let back: SubscriptionProperties = serde_json::from_value(value).unwrap();
        assert_eq!(back, props);
    }

    #[test]
    fn test_envelope_wins_over_bare_field() {
        let props: SubscriptionProperties = serde_json::from_value(json!({
            "destination": {"endpointType": "EventHub", "properties": {"resourceId": "/hubs/bare"}},
            "deliveryWithResourceIdentity": {
                "identity": {"type": "SystemAssigned"},
                "destination": {"endpointType": "EventHub", "properties": {"resourceId": "/hubs/wrapped"}}
            }
        }))
        .unwrap();

        let placement = props.destination.unwrap();
        assert_eq!(placement.identity(), Some(&ResourceIdentity::SystemAssigned));
        assert_eq!(
            placement.inner(),
            &Destination::EventHub(ResourceDestination::new("/hubs/wrapped"))
        );
    }

    #[test]
    fn test_unknown_provisioning_state() {
        let props: SubscriptionProperties =
            serde_json::from_value(json!({"provisioningState": "Migrating"})).unwrap();
        assert_eq!(props.provisioning_state, Some(ProvisioningState::Unknown));
        assert!(props.destination.is_none());
        assert!(props.labels.is_empty());
    }
}
