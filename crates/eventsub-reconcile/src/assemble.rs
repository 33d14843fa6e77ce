//! Composes the expanders into a full write payload.

use time::OffsetDateTime;
use tracing::debug;

use eventsub_config::{DESTINATION_FIELDS, FlatConfig};
use eventsub_core::model::{Placement, RetryPolicy, SubscriptionProperties};
use eventsub_core::{ValidationError, parse_rfc3339};

use crate::expand::{expand_dead_letter, expand_destination, expand_filter, expand_identity};

/// Builds the remote properties for `config`, returning the first
/// validation error encountered.
pub fn assemble_properties(config: &FlatConfig) -> Result<SubscriptionProperties, ValidationError> {
    let destination = expand_destination(config).ok_or_else(|| {
        ValidationError::new(
            "destination",
            format!(
                "one of `{}` must be specified to create an event subscription",
                DESTINATION_FIELDS.join("`, `")
            ),
        )
    })?;
    let delivery_identity = config
        .delivery_identity
        .as_ref()
        .map(|block| expand_identity("delivery_identity", block))
        .transpose()?;

    let dead_letter = expand_dead_letter(config);
    let dead_letter_identity = config
        .dead_letter_identity
        .as_ref()
        .map(|block| expand_identity("dead_letter_identity", block))
        .transpose()?;
    let dead_letter = match (dead_letter, dead_letter_identity) {
        (Some(dead_letter), identity) => Some(Placement::new(dead_letter, identity)),
        (None, Some(_)) => {
            return Err(ValidationError::new(
                "dead_letter_identity",
                "`storage_blob_dead_letter_destination` must be specified when a dead letter identity is set",
            ));
        }
        (None, None) => None,
    };

    let properties = SubscriptionProperties {
        destination: Some(Placement::new(destination, delivery_identity)),
        dead_letter,
        filter: Some(expand_filter(config)?),
        retry_policy: expand_retry_policy(config),
        labels: config.labels.clone(),
        event_delivery_schema: Some(config.event_delivery_schema),
        expiration_time_utc: expand_expiration(config)?,
        provisioning_state: None,
        topic: None,
    };

    debug!(
        name = %config.name,
        endpoint_type = properties.destination().map(|d| d.endpoint_type()),
        identity = properties.destination.as_ref().and_then(|p| p.identity()).map(|i| i.type_name()),
        advanced_filters = config.advanced_filter.len(),
        "Assembled event subscription payload"
    );

    Ok(properties)
}

pub fn expand_retry_policy(config: &FlatConfig) -> Option<RetryPolicy> {
    config.retry_policy.map(|retry| RetryPolicy {
        max_delivery_attempts: retry.max_delivery_attempts,
        event_time_to_live_in_minutes: retry.event_time_to_live,
    })
}

pub fn expand_expiration(config: &FlatConfig) -> Result<Option<OffsetDateTime>, ValidationError> {
    config
        .expiration_time_utc
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(|value| {
            parse_rfc3339(value).map_err(|e| {
                ValidationError::new(
                    "expiration_time_utc",
                    format!("is not an RFC 3339 timestamp: {e}"),
                )
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventsub_config::{IdentityBlock, RetryPolicyBlock, StorageBlobDeadLetterBlock};
    use eventsub_core::model::{Destination, ResourceIdentity};
    use time::macros::datetime;

    fn config() -> FlatConfig {
        let mut config = FlatConfig::new("sub1");
        config.service_bus_topic_endpoint_id = Some("/sbt".into());
        config
    }

    #[test]
    fn test_missing_destination_names_all_fields() {
        let err = assemble_properties(&FlatConfig::new("sub1")).unwrap_err();
        assert_eq!(err.field, "destination");
        assert!(err.message.contains("`azure_function_endpoint`, `eventhub_endpoint_id`"));
        assert!(err.message.contains("`webhook_endpoint`"));
    }

    #[test]
    fn test_direct_placement_without_identity() {
        let properties = assemble_properties(&config()).unwrap();
        assert!(matches!(
            properties.destination,
            Some(Placement::Direct(Destination::ServiceBusTopic(_)))
        ));
        assert!(properties.dead_letter.is_none());
        assert_eq!(
            properties.event_delivery_schema,
            Some(eventsub_core::model::EventDeliverySchema::EventGridSchema)
        );
    }

    #[test]
    fn test_identities_wrap_each_slot_independently() {
        let mut config = config();
        config.delivery_identity = Some(IdentityBlock::system_assigned());
        config.storage_blob_dead_letter_destination = Some(StorageBlobDeadLetterBlock {
            storage_account_id: "/sa".into(),
            storage_blob_container_name: "dl".into(),
        });

        let properties = assemble_properties(&config).unwrap();
        assert_eq!(
            properties.destination.as_ref().and_then(|p| p.identity()),
            Some(&ResourceIdentity::SystemAssigned)
        );
        assert!(matches!(properties.dead_letter, Some(Placement::Direct(_))));

        config.delivery_identity = None;
        config.dead_letter_identity = Some(IdentityBlock::user_assigned("/id"));
        let properties = assemble_properties(&config).unwrap();
        assert!(matches!(properties.destination, Some(Placement::Direct(_))));
        assert!(matches!(properties.dead_letter, Some(Placement::WithIdentity(_))));
    }

    #[test]
    fn test_dead_letter_identity_without_destination() {
        let mut config = config();
        config.dead_letter_identity = Some(IdentityBlock::system_assigned());
        let err = assemble_properties(&config).unwrap_err();
        assert_eq!(err.field, "dead_letter_identity");
    }

    #[test]
    fn test_retry_expiration_and_labels() {
        let mut config = config();
        config.retry_policy = Some(RetryPolicyBlock {
            max_delivery_attempts: 5,
            event_time_to_live: 60,
        });
        config.expiration_time_utc = Some("2030-01-01T10:00:00+02:00".into());
        config.labels = vec!["b".into(), "a".into()];

        let properties = assemble_properties(&config).unwrap();
        assert_eq!(
            properties.retry_policy,
            Some(RetryPolicy {
                max_delivery_attempts: 5,
                event_time_to_live_in_minutes: 60,
            })
        );
        assert_eq!(
            properties.expiration_time_utc,
            Some(datetime!(2030-01-01 08:00:00 UTC))
        );
        assert_eq!(properties.labels, vec!["b", "a"]);
    }

    #[test]
    fn test_bad_expiration() {
        let mut config = config();
        config.expiration_time_utc = Some("2030-13-01".into());
        let err = assemble_properties(&config).unwrap_err();
        assert_eq!(err.field, "expiration_time_utc");
    }
}
