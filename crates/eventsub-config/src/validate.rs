//! Front-end validation of a [`FlatConfig`] against the schema registry.
//!
//! These are the cross-field rules a field's type cannot express. Operand
//! arity of advanced filters and identity shapes are checked by the
//! expanders, which own those conversions.

use std::sync::LazyLock;

use regex::Regex;

use eventsub_core::{ResourceKind, ValidationError, parse_rfc3339};

use crate::flat::{FlatConfig, is_set};
use crate::schema::{DESTINATION_FIELDS, SchemaRegistry};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9]{3,50}$").expect("Invalid name regex"));

const MAX_EVENTS_PER_BATCH: std::ops::RangeInclusive<i32> = 1..=5000;
const PREFERRED_BATCH_SIZE_KB: std::ops::RangeInclusive<i32> = 1..=1024;
const MAX_DELIVERY_ATTEMPTS: std::ops::RangeInclusive<i32> = 1..=30;
const EVENT_TIME_TO_LIVE_MINUTES: std::ops::RangeInclusive<i32> = 1..=1440;

impl FlatConfig {
    /// Checks the configuration, returning the first violation found.
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<(), ValidationError> {
        if !NAME_PATTERN.is_match(&self.name) {
            return Err(ValidationError::new(
                "name",
                "must be 3-50 characters of letters, digits and hyphens",
            ));
        }

        self.validate_scope(registry)?;
        self.validate_destination(registry)?;
        self.validate_batching()?;

        if self.dead_letter_identity.is_some() && self.storage_blob_dead_letter_destination.is_none()
        {
            return Err(ValidationError::new(
                "dead_letter_identity",
                "`storage_blob_dead_letter_destination` must be specified when a dead letter identity is set",
            ));
        }

        if let Some(dead_letter) = &self.storage_blob_dead_letter_destination {
            if dead_letter.storage_account_id.is_empty() {
                return Err(ValidationError::new(
                    "storage_blob_dead_letter_destination.storage_account_id",
                    "must not be empty",
                ));
            }
            if dead_letter.storage_blob_container_name.is_empty() {
                return Err(ValidationError::new(
                    "storage_blob_dead_letter_destination.storage_blob_container_name",
                    "must not be empty",
                ));
            }
        }

        if let Some(expiration) = self.expiration_time_utc.as_deref().filter(|s| !s.is_empty()) {
            parse_rfc3339(expiration).map_err(|e| {
                ValidationError::new("expiration_time_utc", format!("is not an RFC 3339 timestamp: {e}"))
            })?;
        }

        if let Some(retry) = &self.retry_policy {
            check_range(
                "retry_policy.max_delivery_attempts",
                retry.max_delivery_attempts,
                &MAX_DELIVERY_ATTEMPTS,
            )?;
            check_range(
                "retry_policy.event_time_to_live",
                retry.event_time_to_live,
                &EVENT_TIME_TO_LIVE_MINUTES,
            )?;
        }

        Ok(())
    }

    fn validate_scope(&self, registry: &SchemaRegistry) -> Result<(), ValidationError> {
        for field in registry.required_fields() {
            let present = match field.name {
                "name" => !self.name.is_empty(),
                "system_topic" => is_set(&self.system_topic),
                "resource_group_name" => is_set(&self.resource_group_name),
                "scope" => is_set(&self.scope),
                _ => true,
            };
            if !present {
                return Err(ValidationError::new(field.name, "is required"));
            }
        }

        if self.scope.as_deref().is_some_and(|scope| scope.ends_with('/')) {
            return Err(ValidationError::new("scope", "must not end with '/'"));
        }

        let foreign = match registry.kind() {
            ResourceKind::SystemTopicEventSubscription => vec![("scope", is_set(&self.scope))],
            ResourceKind::EventSubscription => vec![
                ("system_topic", is_set(&self.system_topic)),
                ("resource_group_name", is_set(&self.resource_group_name)),
            ],
        };
        for (name, present) in foreign {
            if present && !registry.is_declared(name) {
                return Err(ValidationError::new(
                    name,
                    format!("is not supported by {}", registry.kind().as_str()),
                ));
            }
        }

        Ok(())
    }

    fn validate_destination(&self, registry: &SchemaRegistry) -> Result<(), ValidationError> {
        let set = self.destination_fields_set();
        let Some(first) = set.first() else {
            return Err(ValidationError::new(
                "destination",
                format!("one of {} must be specified", quoted(&DESTINATION_FIELDS)),
            ));
        };

        for second in &set[1..] {
            let conflicts = registry
                .field(second)
                .is_some_and(|field| field.conflicts_with.contains(first));
            if conflicts {
                return Err(ValidationError::new(
                    *second,
                    format!("conflicts with `{first}`"),
                ));
            }
        }

        if let Some(webhook) = &self.webhook_endpoint {
            if !webhook.url.starts_with("https://") {
                return Err(ValidationError::new(
                    "webhook_endpoint.url",
                    "must be an https URL",
                ));
            }
        }
        if let Some(function) = &self.azure_function_endpoint {
            if function.function_id.is_empty() {
                return Err(ValidationError::new(
                    "azure_function_endpoint.function_id",
                    "must not be empty",
                ));
            }
        }
        if let Some(queue) = &self.storage_queue_endpoint {
            if queue.storage_account_id.is_empty() {
                return Err(ValidationError::new(
                    "storage_queue_endpoint.storage_account_id",
                    "must not be empty",
                ));
            }
            if queue.queue_name.is_empty() {
                return Err(ValidationError::new(
                    "storage_queue_endpoint.queue_name",
                    "must not be empty",
                ));
            }
        }

        Ok(())
    }

    fn validate_batching(&self) -> Result<(), ValidationError> {
        let batching = [
            (
                "azure_function_endpoint",
                self.azure_function_endpoint
                    .as_ref()
                    .map(|f| (f.max_events_per_batch, f.preferred_batch_size_in_kilobytes)),
            ),
            (
                "webhook_endpoint",
                self.webhook_endpoint
                    .as_ref()
                    .map(|w| (w.max_events_per_batch, w.preferred_batch_size_in_kilobytes)),
            ),
        ];

        for (block, options) in batching {
            let Some((max_events, batch_kb)) = options else {
                continue;
            };
            if let Some(value) = max_events {
                check_range(
                    &format!("{block}.max_events_per_batch"),
                    value,
                    &MAX_EVENTS_PER_BATCH,
                )?;
            }
            if let Some(value) = batch_kb {
                check_range(
                    &format!("{block}.preferred_batch_size_in_kilobytes"),
                    value,
                    &PREFERRED_BATCH_SIZE_KB,
                )?;
            }
        }

        Ok(())
    }
}

fn check_range(
    field: &str,
    value: i32,
    range: &std::ops::RangeInclusive<i32>,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!(
                "must be between {} and {}, got {value}",
                range.start(),
                range.end()
            ),
        ))
    }
}

fn quoted(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("`{f}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
