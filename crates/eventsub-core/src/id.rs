//! Identifiers for event subscriptions.
//!
//! Two sibling resource kinds share the same configuration surface and differ
//! only in the parent scope they hang off:
//!
//! ```text
//! /subscriptions/{s}/resourceGroups/{rg}/providers/Microsoft.EventGrid/systemTopics/{t}/eventSubscriptions/{n}
//! {scope}/providers/Microsoft.EventGrid/eventSubscriptions/{n}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const PROVIDER_NAMESPACE: &str = "Microsoft.EventGrid";

/// The resource kinds that share the event subscription schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Subscription on a system topic, addressed by resource group and topic name.
    SystemTopicEventSubscription,
    /// Subscription on an arbitrary scope (resource, resource group, subscription).
    EventSubscription,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemTopicEventSubscription => "eventgrid_system_topic_event_subscription",
            Self::EventSubscription => "eventgrid_event_subscription",
        }
    }

    /// Human readable name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SystemTopicEventSubscription => "EventGrid System Topic Event Subscription",
            Self::EventSubscription => "EventGrid Event Subscription",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eventgrid_system_topic_event_subscription" | "SystemTopicEventSubscription" => {
                Ok(Self::SystemTopicEventSubscription)
            }
            "eventgrid_event_subscription" | "EventSubscription" => Ok(Self::EventSubscription),
            other => Err(CoreError::invalid_id(format!("unknown resource kind '{other}'"))),
        }
    }
}

/// The parent scope of an event subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionScope {
    SystemTopic {
        subscription_id: String,
        resource_group: String,
        system_topic: String,
    },
    /// A full ARM scope such as `/subscriptions/{s}/resourceGroups/{rg}`.
    Scope(String),
}

impl SubscriptionScope {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::SystemTopic { .. } => ResourceKind::SystemTopicEventSubscription,
            Self::Scope(_) => ResourceKind::EventSubscription,
        }
    }

    /// Short label for logs and error context.
    pub fn label(&self) -> &str {
        match self {
            Self::SystemTopic { system_topic, .. } => system_topic,
            Self::Scope(scope) => scope,
        }
    }
}

/// Fully qualified identifier of an event subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventSubscriptionId {
    pub scope: SubscriptionScope,
    pub name: String,
}

impl EventSubscriptionId {
    pub fn new(scope: SubscriptionScope, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }

    pub fn system_topic(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        system_topic: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(
            SubscriptionScope::SystemTopic {
                subscription_id: subscription_id.into(),
                resource_group: resource_group.into(),
                system_topic: system_topic.into(),
            },
            name,
        )
    }

    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(SubscriptionScope::Scope(scope.into()), name)
    }

    pub fn kind(&self) -> ResourceKind {
        self.scope.kind()
    }
}

impl fmt::Display for EventSubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            SubscriptionScope::SystemTopic {
                subscription_id,
                resource_group,
                system_topic,
            } => write!(
                f,
                "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/{PROVIDER_NAMESPACE}/systemTopics/{system_topic}/eventSubscriptions/{}",
                self.name
            ),
            SubscriptionScope::Scope(scope) => write!(
                f,
                "{}/providers/{PROVIDER_NAMESPACE}/eventSubscriptions/{}",
                scope.trim_end_matches('/'),
                self.name
            ),
        }
    }
}

impl FromStr for EventSubscriptionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.trim_matches('/').split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(CoreError::invalid_id(format!("'{s}' contains an empty segment")));
        }

        let len = segments.len();
        if len < 5 || !segments[len - 2].eq_ignore_ascii_case("eventSubscriptions") {
            return Err(CoreError::invalid_id(format!(
                "'{s}' does not end in eventSubscriptions/{{name}}"
            )));
        }
        let name = segments[len - 1];

        let system_topic_form = len == 10
            && segments[0].eq_ignore_ascii_case("subscriptions")
            && segments[2].eq_ignore_ascii_case("resourceGroups")
            && segments[4].eq_ignore_ascii_case("providers")
            && segments[5].eq_ignore_ascii_case(PROVIDER_NAMESPACE)
            && segments[6].eq_ignore_ascii_case("systemTopics");
        if system_topic_form {
            return Ok(Self::system_topic(
                segments[1],
                segments[3],
                segments[7],
                name,
            ));
        }

        if segments[len - 4].eq_ignore_ascii_case("providers")
            && segments[len - 3].eq_ignore_ascii_case(PROVIDER_NAMESPACE)
        {
            let scope = &segments[..len - 4];
            if scope.is_empty() {
                return Err(CoreError::invalid_id(format!("'{s}' has an empty scope")));
            }
            return Ok(Self::scoped(format!("/{}", scope.join("/")), name));
        }

        Err(CoreError::invalid_id(format!(
            "'{s}' is not an {PROVIDER_NAMESPACE} event subscription ID"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_TOPIC_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.EventGrid/systemTopics/topic1/eventSubscriptions/sub1";

    #[test]
    fn test_parse_system_topic_id() {
        let id: EventSubscriptionId = SYSTEM_TOPIC_ID.parse().unwrap();
        assert_eq!(id.name, "sub1");
        assert_eq!(id.kind(), ResourceKind::SystemTopicEventSubscription);
        assert_eq!(id.scope.label(), "topic1");
        assert_eq!(id.to_string(), SYSTEM_TOPIC_ID);
    }

    #[test]
    fn test_parse_is_case_insensitive_on_keys() {
        let lower = SYSTEM_TOPIC_ID
            .replace("resourceGroups", "resourcegroups")
            .replace("systemTopics", "systemtopics");
        let id: EventSubscriptionId = lower.parse().unwrap();
        assert_eq!(id.kind(), ResourceKind::SystemTopicEventSubscription);
        assert_eq!(id.to_string(), SYSTEM_TOPIC_ID);
    }

    #[test]
    fn test_parse_scoped_id() {
        let raw = "/subscriptions/s1/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/acct/providers/Microsoft.EventGrid/eventSubscriptions/sub2";
        let id: EventSubscriptionId = raw.parse().unwrap();
        assert_eq!(id.name, "sub2");
        assert_eq!(
            id.scope,
            SubscriptionScope::Scope(
                "/subscriptions/s1/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/acct"
                    .to_string()
            )
        );
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_parse_rejects_foreign_ids() {
        assert!("/subscriptions/s1/resourceGroups/rg1".parse::<EventSubscriptionId>().is_err());
        assert!(
            "/subscriptions/s1/providers/Microsoft.Web/eventSubscriptions/x"
                .parse::<EventSubscriptionId>()
                .is_err()
        );
        assert!("providers/Microsoft.EventGrid/eventSubscriptions/x"
            .parse::<EventSubscriptionId>()
            .is_err());
        assert!("/subscriptions//resourceGroups/rg/providers/Microsoft.EventGrid/systemTopics/t/eventSubscriptions/n"
            .parse::<EventSubscriptionId>()
            .is_err());
    }

    #[test]
    fn test_resource_kind_from_str() {
        assert_eq!(
            "eventgrid_event_subscription".parse::<ResourceKind>().unwrap(),
            ResourceKind::EventSubscription
        );
        assert!("topic".parse::<ResourceKind>().is_err());
    }
}
