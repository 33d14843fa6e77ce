//! In-memory control-plane backend.
//!
//! Behaves like the remote service as far as the reconciler can observe:
//! - the service assigns `id`, `name`, `type` and the provisioning state
//! - webhook endpoint URLs are write-only; only the base URL is stored and the
//!   full URL is served by [`EventSubscriptionClient::get_full_url`]
//!
//! Faults can be injected to exercise error paths. Each injected fault fires
//! once.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use eventsub_core::model::{Destination, EventSubscription, ProvisioningState};
use eventsub_core::{EventSubscriptionId, SubscriptionScope};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;
use crate::traits::{EventSubscriptionClient, Operation, OperationStatus};

const SYSTEM_TOPIC_SUBSCRIPTION_TYPE: &str = "Microsoft.EventGrid/systemTopics/eventSubscriptions";
const SUBSCRIPTION_TYPE: &str = "Microsoft.EventGrid/eventSubscriptions";

/// A fault the in-memory client raises on the next matching call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `get` fails with a transport error.
    GetFails,
    /// `create_or_update` is rejected with a transport error.
    WriteFails,
    /// The next write is stored but its operation ends in `Failed`.
    OperationFails,
    /// The next operation never reaches a terminal state.
    OperationHangs,
    /// `delete` fails with a transport error.
    DeleteFails,
    /// `get_full_url` fails with a transport error.
    FullUrlFails,
    /// The next successful `get` returns the resource without its `id`.
    ReadBackWithoutId,
}

/// A subscription as held by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubscription {
    pub subscription: EventSubscription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
}

/// In-memory implementation of [`EventSubscriptionClient`].
#[derive(Debug, Default)]
pub struct InMemoryClient {
    data: DashMap<String, StoredSubscription>,
    faults: Mutex<Vec<Fault>>,
    writes: AtomicU64,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a client from a previous [`snapshot`](Self::snapshot).
    pub fn from_snapshot(entries: Vec<StoredSubscription>) -> Self {
        let client = Self::new();
        for entry in entries {
            if let Some(key) = entry.subscription.id.as_deref().map(storage_key) {
                client.data.insert(key, entry);
            }
        }
        client
    }

    /// All stored subscriptions, ordered by ID.
    pub fn snapshot(&self) -> Vec<StoredSubscription> {
        let mut entries: Vec<StoredSubscription> =
            self.data.iter().map(|entry| entry.value().clone()).collect();
        entries.sort_by(|a, b| a.subscription.id.cmp(&b.subscription.id));
        entries
    }

    /// Places a subscription directly into the store, bypassing
    /// normalisation. Used to seed drifted or pre-existing remote state.
    pub fn seed(&self, id: &EventSubscriptionId, stored: StoredSubscription) {
        self.data.insert(storage_key(&id.to_string()), stored);
    }

    /// Removes a subscription behind the reconciler's back.
    pub fn remove(&self, id: &EventSubscriptionId) -> bool {
        self.data.remove(&storage_key(&id.to_string())).is_some()
    }

    pub fn inject_fault(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(fault);
    }

    /// Number of accepted `create_or_update` calls.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn take_fault(&self, fault: Fault) -> bool {
        let mut faults = self
            .faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match faults.iter().position(|f| *f == fault) {
            Some(index) => {
                faults.remove(index);
                true
            }
            None => false,
        }
    }

    fn operation(&self, failure: Option<String>) -> Box<dyn Operation> {
        let outcome = if self.take_fault(Fault::OperationHangs) {
            MemoryOutcome::Hang
        } else {
            match failure {
                Some(message) => MemoryOutcome::Failed(message),
                None => MemoryOutcome::Succeeded,
            }
        };
        Box::new(MemoryOperation { outcome })
    }
}

fn storage_key(id: &str) -> String {
    id.to_ascii_lowercase()
}

fn topic_of(id: &EventSubscriptionId) -> String {
    match &id.scope {
        SubscriptionScope::SystemTopic {
            subscription_id,
            resource_group,
            system_topic,
        } => format!(
            "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/Microsoft.EventGrid/systemTopics/{system_topic}"
        ),
        SubscriptionScope::Scope(scope) => scope.clone(),
    }
}

fn base_url(url: &str) -> String {
    url.split_once('?')
        .map_or(url, |(base, _)| base)
        .to_string()
}

#[async_trait]
impl EventSubscriptionClient for InMemoryClient {
    async fn get(
        &self,
        id: &EventSubscriptionId,
    ) -> Result<Option<EventSubscription>, ClientError> {
        if self.take_fault(Fault::GetFails) {
            return Err(ClientError::transport("injected get failure"));
        }

        let Some(stored) = self.data.get(&storage_key(&id.to_string())) else {
            return Ok(None);
        };
        let mut subscription = stored.subscription.clone();
        drop(stored);

        if self.take_fault(Fault::ReadBackWithoutId) {
            subscription.id = None;
        }
        Ok(Some(subscription))
    }

    async fn create_or_update(
        &self,
        id: &EventSubscriptionId,
        subscription: &EventSubscription,
    ) -> Result<Box<dyn Operation>, ClientError> {
        if self.take_fault(Fault::WriteFails) {
            return Err(ClientError::transport("injected write failure"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);

        let key = storage_key(&id.to_string());
        let previous_full_url = self.data.get(&key).and_then(|s| s.full_url.clone());

        let mut stored = subscription.clone();
        stored.id = Some(id.to_string());
        stored.name = Some(id.name.clone());
        stored.resource_type = Some(
            match id.scope {
                SubscriptionScope::SystemTopic { .. } => SYSTEM_TOPIC_SUBSCRIPTION_TYPE,
                SubscriptionScope::Scope(_) => SUBSCRIPTION_TYPE,
            }
            .to_string(),
        );

        let failure = self
            .take_fault(Fault::OperationFails)
            .then(|| "injected operation failure".to_string());

        let mut full_url = None;
        let properties = stored.properties.get_or_insert_with(Default::default);
        properties.topic = Some(topic_of(id));
        properties.provisioning_state = Some(if failure.is_some() {
            ProvisioningState::Failed
        } else {
            ProvisioningState::Succeeded
        });
        if let Some(Destination::WebHook(webhook)) =
            properties.destination.as_mut().map(|p| p.inner_mut())
        {
            full_url = webhook.endpoint_url.take().or(previous_full_url);
            webhook.endpoint_base_url = full_url.as_deref().map(base_url);
        }

        debug!(
            id = %id,
            endpoint_type = properties.destination().map(Destination::endpoint_type),
            "Stored event subscription"
        );
        self.data.insert(
            key,
            StoredSubscription {
                subscription: stored,
                full_url,
            },
        );

        Ok(self.operation(failure))
    }

    async fn delete(&self, id: &EventSubscriptionId) -> Result<Box<dyn Operation>, ClientError> {
        if self.take_fault(Fault::DeleteFails) {
            return Err(ClientError::transport("injected delete failure"));
        }
        if self.data.remove(&storage_key(&id.to_string())).is_none() {
            return Err(ClientError::not_found(id.to_string()));
        }
        debug!(id = %id, "Deleted event subscription");
        Ok(self.operation(None))
    }

    async fn get_full_url(&self, id: &EventSubscriptionId) -> Result<String, ClientError> {
        if self.take_fault(Fault::FullUrlFails) {
            return Err(ClientError::transport("injected full URL failure"));
        }
        let stored = self
            .data
            .get(&storage_key(&id.to_string()))
            .ok_or_else(|| ClientError::not_found(id.to_string()))?;
        stored.full_url.clone().ok_or_else(|| {
            ClientError::conflict(format!("{id} does not deliver to a webhook endpoint"))
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug)]
enum MemoryOutcome {
    Succeeded,
    Failed(String),
    Hang,
}

#[derive(Debug)]
struct MemoryOperation {
    outcome: MemoryOutcome,
}

#[async_trait]
impl Operation for MemoryOperation {
    async fn wait_for_completion(&mut self) -> Result<OperationStatus, ClientError> {
        match &self.outcome {
            MemoryOutcome::Succeeded => Ok(OperationStatus::Succeeded),
            MemoryOutcome::Failed(message) => Ok(OperationStatus::Failed {
                message: message.clone(),
            }),
            MemoryOutcome::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventsub_core::model::{
        Placement, ResourceDestination, SubscriptionProperties, WebHookDestination,
    };

    fn id() -> EventSubscriptionId {
        EventSubscriptionId::system_topic("s1", "rg1", "topic1", "sub1")
    }

    fn webhook_subscription(url: &str) -> EventSubscription {
        EventSubscription::from_properties(SubscriptionProperties {
            destination: Some(Placement::Direct(Destination::WebHook(WebHookDestination {
                endpoint_url: Some(url.to_string()),
                ..Default::default()
            }))),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_create_assigns_server_fields() {
        let client = InMemoryClient::new();
        let mut op = client
            .create_or_update(&id(), &webhook_subscription("https://example.com/hook?code=s3cret"))
            .await
            .unwrap();
        assert_eq!(op.wait_for_completion().await.unwrap(), OperationStatus::Succeeded);

        let read = client.get(&id()).await.unwrap().unwrap();
        assert_eq!(read.id.as_deref(), Some(id().to_string().as_str()));
        assert_eq!(read.name.as_deref(), Some("sub1"));
        let props = read.properties.unwrap();
        assert_eq!(props.provisioning_state, Some(ProvisioningState::Succeeded));
        assert_eq!(
            props.topic.as_deref(),
            Some("/subscriptions/s1/resourceGroups/rg1/providers/Microsoft.EventGrid/systemTopics/topic1")
        );

        let webhook = props.destination().unwrap().as_webhook().unwrap();
        assert!(webhook.endpoint_url.is_none());
        assert_eq!(webhook.endpoint_base_url.as_deref(), Some("https://example.com/hook"));
        assert_eq!(
            client.get_full_url(&id()).await.unwrap(),
            "https://example.com/hook?code=s3cret"
        );
        assert_eq!(client.write_count(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let client = InMemoryClient::new();
        assert!(client.get(&id()).await.unwrap().is_none());
        assert!(client.get_full_url(&id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let client = InMemoryClient::new();
        let err = client.delete(&id()).await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_faults_fire_once() {
        let client = InMemoryClient::new();
        client.inject_fault(Fault::GetFails);
        assert!(client.get(&id()).await.is_err());
        assert!(client.get(&id()).await.is_ok());

        client.inject_fault(Fault::OperationFails);
        let subscription = EventSubscription::from_properties(SubscriptionProperties {
            destination: Some(Placement::Direct(Destination::EventHub(
                ResourceDestination::new("/hubs/h1"),
            ))),
            ..Default::default()
        });
        let mut op = client.create_or_update(&id(), &subscription).await.unwrap();
        assert!(matches!(
            op.wait_for_completion().await.unwrap(),
            OperationStatus::Failed { .. }
        ));
        let mut op = client.create_or_update(&id(), &subscription).await.unwrap();
        assert_eq!(op.wait_for_completion().await.unwrap(), OperationStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_hanging_operation_never_completes() {
        let client = InMemoryClient::new();
        client.inject_fault(Fault::OperationHangs);
        let mut op = client
            .create_or_update(&id(), &webhook_subscription("https://example.com/hook"))
            .await
            .unwrap();
        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            op.wait_for_completion(),
        )
        .await;
        assert!(waited.is_err());
        // The write still landed remotely.
        assert_eq!(client.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let client = InMemoryClient::new();
        client
            .create_or_update(&id(), &webhook_subscription("https://example.com/hook"))
            .await
            .unwrap();
        let json = serde_json::to_string(&client.snapshot()).unwrap();
        let restored =
            InMemoryClient::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.snapshot(), client.snapshot());
        assert_eq!(
            restored.get_full_url(&id()).await.unwrap(),
            "https://example.com/hook"
        );
    }
}
