//! Field schema registry.
//!
//! Both resource kinds share one configuration surface; they differ only in
//! the fields that identify the parent scope.

use eventsub_core::ResourceKind;
use eventsub_core::model::{AdvancedFilterOperator, EventDeliverySchema};

/// The seven mutually exclusive destination fields, in expansion priority
/// order. The first populated field wins.
pub const DESTINATION_FIELDS: [&str; 7] = [
    "azure_function_endpoint",
    "eventhub_endpoint_id",
    "hybrid_connection_endpoint_id",
    "service_bus_queue_endpoint_id",
    "service_bus_topic_endpoint_id",
    "storage_queue_endpoint",
    "webhook_endpoint",
];

const IDENTITY_TYPES: &[&str] = &["SystemAssigned", "UserAssigned"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
    StringList,
    Block,
    BlockList,
    Enum(Vec<&'static str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Set by the service, ignored on write.
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub presence: Presence,
    /// Changing the value requires replacing the remote resource.
    pub force_new: bool,
    pub conflicts_with: Vec<&'static str>,
}

impl FieldSpec {
    fn new(name: &'static str, field_type: FieldType, presence: Presence) -> Self {
        Self {
            name,
            field_type,
            presence,
            force_new: false,
            conflicts_with: Vec::new(),
        }
    }

    fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self::new(name, field_type, Presence::Optional)
    }

    fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    fn destination(name: &'static str, field_type: FieldType) -> Self {
        let mut field = Self::optional(name, field_type);
        field.conflicts_with = DESTINATION_FIELDS
            .into_iter()
            .filter(|other| *other != name)
            .collect();
        field
    }

    pub fn allowed_values(&self) -> Option<&[&'static str]> {
        match &self.field_type {
            FieldType::Enum(values) => Some(values),
            _ => None,
        }
    }
}

/// The declared configuration surface of one resource kind.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    kind: ResourceKind,
    fields: Vec<FieldSpec>,
}

impl SchemaRegistry {
    pub fn for_kind(kind: ResourceKind) -> Self {
        let mut fields = vec![
            FieldSpec::new("name", FieldType::String, Presence::Required).force_new(),
        ];

        match kind {
            ResourceKind::SystemTopicEventSubscription => {
                fields.push(
                    FieldSpec::new("system_topic", FieldType::String, Presence::Required)
                        .force_new(),
                );
                fields.push(
                    FieldSpec::new("resource_group_name", FieldType::String, Presence::Required)
                        .force_new(),
                );
            }
            ResourceKind::EventSubscription => {
                fields.push(
                    FieldSpec::new("scope", FieldType::String, Presence::Required).force_new(),
                );
            }
        }

        fields.extend([
            FieldSpec::optional(
                "event_delivery_schema",
                FieldType::Enum(EventDeliverySchema::ALL.iter().map(|s| s.as_str()).collect()),
            )
            .force_new(),
            FieldSpec::optional("expiration_time_utc", FieldType::String),
            FieldSpec::destination("azure_function_endpoint", FieldType::Block),
            FieldSpec::destination("eventhub_endpoint_id", FieldType::String),
            FieldSpec::destination("hybrid_connection_endpoint_id", FieldType::String),
            FieldSpec::destination("service_bus_queue_endpoint_id", FieldType::String),
            FieldSpec::destination("service_bus_topic_endpoint_id", FieldType::String),
            FieldSpec::destination("storage_queue_endpoint", FieldType::Block),
            FieldSpec::destination("webhook_endpoint", FieldType::Block),
            FieldSpec::optional("included_event_types", FieldType::StringList),
            FieldSpec::optional("subject_filter", FieldType::Block),
            FieldSpec::optional("advanced_filter", FieldType::BlockList),
            FieldSpec::optional(
                "advanced_filter.operator",
                FieldType::Enum(AdvancedFilterOperator::ALL.iter().map(|op| op.as_str()).collect()),
            ),
            FieldSpec::optional("advanced_filtering_on_arrays_enabled", FieldType::Bool),
            FieldSpec::optional("delivery_identity", FieldType::Block),
            FieldSpec::optional(
                "delivery_identity.type",
                FieldType::Enum(IDENTITY_TYPES.to_vec()),
            ),
            FieldSpec::optional("dead_letter_identity", FieldType::Block),
            FieldSpec::optional(
                "dead_letter_identity.type",
                FieldType::Enum(IDENTITY_TYPES.to_vec()),
            ),
            FieldSpec::optional("storage_blob_dead_letter_destination", FieldType::Block),
            FieldSpec::optional("retry_policy", FieldType::Block),
            FieldSpec::optional("labels", FieldType::StringList),
            FieldSpec::new("webhook_endpoint.base_url", FieldType::String, Presence::Computed),
        ]);

        Self { kind, fields }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|field| field.presence == Presence::Required)
    }

    pub fn force_new_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.force_new)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}
