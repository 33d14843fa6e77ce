//! Drives create, read, update and delete of one event subscription against
//! the remote control plane.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use eventsub_client::{ClientError, EventSubscriptionClient, OperationStatus};
use eventsub_config::{FlatConfig, SchemaRegistry};
use eventsub_core::model::{EventSubscription, SubscriptionProperties};
use eventsub_core::{EventSubscriptionId, ResourceKind, SubscriptionScope, ValidationError};

use crate::assemble::assemble_properties;
use crate::context::{Interrupted, OperationContext};
use crate::error::{Phase, ReconcileError, Result};
use crate::flatten::flatten_subscription;

/// Where a resource is in its lifecycle, as far as this process knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Present => "present",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        };
        f.write_str(s)
    }
}

/// Locally tracked state of one managed resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    /// Remote ID. `None` until the resource has been created or imported.
    pub id: Option<String>,
    pub lifecycle: Lifecycle,
}

impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a resource that already exists remotely.
    pub fn imported(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            lifecycle: Lifecycle::Present,
        }
    }

    /// Takes over `id` after a write whose outcome is unknown, so that a
    /// retry updates the resource instead of colliding with it.
    fn claim(&mut self, id: &str) {
        if self.id.is_none() {
            debug!(id, "Tracking resource of an interrupted write");
            self.id = Some(id.to_string());
        }
    }

    fn transition(&mut self, to: Lifecycle) {
        if self.lifecycle != to {
            debug!(id = ?self.id, from = %self.lifecycle, to = %to, "Lifecycle transition");
            self.lifecycle = to;
        }
    }
}

/// A validated write: the target identifier and its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: EventSubscriptionId,
    pub properties: SubscriptionProperties,
}

/// Error context shared by the remote failures of one operation.
struct Target<'a> {
    kind: ResourceKind,
    id: &'a EventSubscriptionId,
}

impl Target<'_> {
    fn transport(&self, phase: Phase, source: ClientError) -> ReconcileError {
        ReconcileError::RemoteTransport {
            kind: self.kind,
            name: self.id.name.clone(),
            scope: self.id.scope.label().to_string(),
            phase,
            source,
        }
    }

    fn failed(&self, phase: Phase, message: String) -> ReconcileError {
        ReconcileError::OperationFailed {
            kind: self.kind,
            name: self.id.name.clone(),
            scope: self.id.scope.label().to_string(),
            phase,
            message,
        }
    }

    fn unknown(&self, phase: Phase, interrupted: Interrupted) -> ReconcileError {
        ReconcileError::OutcomeUnknown {
            kind: self.kind,
            name: self.id.name.clone(),
            scope: self.id.scope.label().to_string(),
            phase,
            reason: interrupted.reason().to_string(),
        }
    }

    fn inconsistent(&self, message: impl Into<String>) -> ReconcileError {
        ReconcileError::InconsistentState {
            kind: self.kind,
            name: self.id.name.clone(),
            scope: self.id.scope.label().to_string(),
            message: message.into(),
        }
    }
}

/// Reconciles flat configurations of one resource kind.
pub struct Reconciler<C: ?Sized> {
    client: Arc<C>,
    kind: ResourceKind,
    subscription_id: String,
    registry: SchemaRegistry,
}

impl<C> Reconciler<C>
where
    C: EventSubscriptionClient + ?Sized,
{
    /// `subscription_id` addresses system topics; it is unused for scoped
    /// subscriptions.
    pub fn new(client: Arc<C>, kind: ResourceKind, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            kind,
            subscription_id: subscription_id.into(),
            registry: SchemaRegistry::for_kind(kind),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    fn invalid(&self, name: &str, source: ValidationError) -> ReconcileError {
        ReconcileError::Validation {
            kind: self.kind,
            name: name.to_string(),
            source,
        }
    }

    /// The first `force_new` field that differs between the tracked resource
    /// and the new target.
    fn replaced_field(
        &self,
        known: &EventSubscriptionId,
        target: &EventSubscriptionId,
    ) -> Option<&'static str> {
        use SubscriptionScope::{Scope, SystemTopic};

        let differs = |a: &str, b: &str| !a.eq_ignore_ascii_case(b);
        let changed = |field: &str| match (field, &known.scope, &target.scope) {
            ("name", _, _) => differs(&known.name, &target.name),
            (
                "system_topic",
                SystemTopic { system_topic: a, .. },
                SystemTopic { system_topic: b, .. },
            ) => differs(a, b),
            (
                "resource_group_name",
                SystemTopic {
                    resource_group: a, ..
                },
                SystemTopic {
                    resource_group: b, ..
                },
            ) => differs(a, b),
            ("scope", Scope(a), Scope(b)) => {
                differs(a.trim_end_matches('/'), b.trim_end_matches('/'))
            }
            _ => false,
        };

        self.registry
            .force_new_fields()
            .map(|field| field.name)
            .find(|&name| changed(name))
    }

    /// Validates `config` and assembles its write payload without touching
    /// the remote service.
    pub fn plan(&self, config: &FlatConfig) -> Result<Plan> {
        let invalid = |source| self.invalid(&config.name, source);
        config.validate(&self.registry).map_err(invalid)?;
        let id = config
            .target_id(self.kind, &self.subscription_id)
            .map_err(invalid)?;
        let properties = assemble_properties(config).map_err(invalid)?;
        Ok(Plan { id, properties })
    }

    /// Creates or updates the subscription described by `config` and returns
    /// the configuration as read back from the service.
    ///
    /// A new resource is only created if nothing exists at its ID yet;
    /// otherwise the existing resource has to be imported first.
    pub async fn create_or_update(
        &self,
        ctx: &OperationContext,
        config: &FlatConfig,
        state: &mut ResourceState,
    ) -> Result<FlatConfig> {
        let Plan { id, properties } = self.plan(config)?;
        let target = Target {
            kind: self.kind,
            id: &id,
        };

        let target_id = id.to_string();
        let creating = match state.id.as_deref() {
            None => true,
            Some(known) if known.eq_ignore_ascii_case(&target_id) => false,
            Some(known) => {
                // Name and scope are immutable once the resource exists.
                let known_id: EventSubscriptionId = known.parse()?;
                let field = self.replaced_field(&known_id, &id).unwrap_or(match self.kind {
                    ResourceKind::SystemTopicEventSubscription => "system_topic",
                    ResourceKind::EventSubscription => "scope",
                });
                return Err(self.invalid(
                    &config.name,
                    ValidationError::new(
                        field,
                        format!(
                            "cannot be changed: {known} would be replaced by {target_id}; delete it first"
                        ),
                    ),
                ));
            }
        };

        if creating {
            let existing = ctx
                .run(self.client.get(&id))
                .await
                .map_err(|i| target.unknown(Phase::ExistenceCheck, i))?
                .map_err(|e| target.transport(Phase::ExistenceCheck, e))?;
            if let Some(existing_id) = existing.and_then(|s| s.id) {
                return Err(ReconcileError::ImportCollision {
                    kind: self.kind,
                    existing_id,
                });
            }
            state.transition(Lifecycle::Creating);
        } else {
            state.transition(Lifecycle::Updating);
        }

        info!(
            kind = %self.kind,
            name = %id.name,
            scope = %id.scope.label(),
            lifecycle = %state.lifecycle,
            backend = self.client.backend_name(),
            "Writing event subscription"
        );

        let body = EventSubscription::from_properties(properties);
        let mut operation = match ctx.run(self.client.create_or_update(&id, &body)).await {
            Err(interrupted) => {
                state.claim(&target_id);
                return Err(target.unknown(Phase::Write, interrupted));
            }
            Ok(submitted) => submitted.map_err(|e| target.transport(Phase::Write, e))?,
        };

        let status = match ctx.run(operation.wait_for_completion()).await {
            Err(interrupted) => {
                state.claim(&target_id);
                return Err(target.unknown(Phase::WaitForWrite, interrupted));
            }
            Ok(finished) => finished.map_err(|e| target.transport(Phase::WaitForWrite, e))?,
        };
        if let OperationStatus::Failed { message } = status {
            return Err(target.failed(Phase::WaitForWrite, message));
        }

        let written = ctx
            .run(self.client.get(&id))
            .await
            .map_err(|i| target.unknown(Phase::ReadBack, i))?
            .map_err(|e| target.transport(Phase::ReadBack, e))?
            .ok_or_else(|| target.inconsistent("resource was not found after a successful write"))?;
        let remote_id = written
            .id
            .ok_or_else(|| target.inconsistent("service returned a resource without an ID"))?;

        state.id = Some(remote_id);
        state.transition(Lifecycle::Present);
        info!(
            kind = %self.kind,
            name = %id.name,
            scope = %id.scope.label(),
            "Event subscription written"
        );

        self.read(ctx, state)
            .await?
            .ok_or_else(|| target.inconsistent("resource disappeared while reading it back"))
    }

    /// Reads the subscription tracked by `state`.
    ///
    /// Returns `Ok(None)` and forgets the ID if the resource no longer
    /// exists.
    pub async fn read(
        &self,
        ctx: &OperationContext,
        state: &mut ResourceState,
    ) -> Result<Option<FlatConfig>> {
        let Some(raw_id) = state.id.as_deref() else {
            return Ok(None);
        };
        let id: EventSubscriptionId = raw_id.parse()?;
        let target = Target {
            kind: self.kind,
            id: &id,
        };

        let found = match ctx.run(self.client.get(&id)).await {
            Err(interrupted) => return Err(target.unknown(Phase::Read, interrupted)),
            Ok(Err(e)) if e.is_not_found() => None,
            Ok(Err(e)) => return Err(target.transport(Phase::Read, e)),
            Ok(Ok(found)) => found,
        };

        let Some(subscription) = found else {
            warn!(
                kind = %self.kind,
                id = %id,
                "Event subscription was not found - removing from state"
            );
            state.id = None;
            state.transition(Lifecycle::Absent);
            return Ok(None);
        };

        let properties = subscription.properties.unwrap_or_default();
        let full_url = if properties.destination().is_some_and(|d| d.is_webhook()) {
            let url = ctx
                .run(self.client.get_full_url(&id))
                .await
                .map_err(|i| target.unknown(Phase::FullUrl, i))?
                .map_err(|e| target.transport(Phase::FullUrl, e))?;
            Some(url)
        } else {
            None
        };

        let name = subscription
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.name.clone());
        let config = flatten_subscription(&id, &properties, &name, full_url.as_deref());
        debug!(
            kind = %self.kind,
            id = %id,
            destinations = ?config.destination_fields_set(),
            "Read event subscription"
        );

        if matches!(state.lifecycle, Lifecycle::Absent | Lifecycle::Creating) {
            state.transition(Lifecycle::Present);
        }
        Ok(Some(config))
    }

    /// Deletes the subscription tracked by `state` and forgets its ID.
    ///
    /// A resource that is already gone is reported as drift; its ID is
    /// forgotten as well.
    pub async fn delete(&self, ctx: &OperationContext, state: &mut ResourceState) -> Result<()> {
        let Some(raw_id) = state.id.as_deref() else {
            return Ok(());
        };
        let id: EventSubscriptionId = raw_id.parse()?;
        let target = Target {
            kind: self.kind,
            id: &id,
        };

        state.transition(Lifecycle::Deleting);
        info!(kind = %self.kind, id = %id, "Deleting event subscription");

        let mut operation = match ctx.run(self.client.delete(&id)).await {
            Err(interrupted) => return Err(target.unknown(Phase::Delete, interrupted)),
            Ok(Err(e)) if e.is_not_found() => {
                warn!(
                    kind = %self.kind,
                    id = %id,
                    "Event subscription was already gone - removing from state"
                );
                state.id = None;
                state.transition(Lifecycle::Absent);
                return Err(ReconcileError::DriftNotFound {
                    kind: self.kind,
                    id: id.to_string(),
                });
            }
            Ok(Err(e)) => return Err(target.transport(Phase::Delete, e)),
            Ok(Ok(operation)) => operation,
        };

        let status = ctx
            .run(operation.wait_for_completion())
            .await
            .map_err(|i| target.unknown(Phase::WaitForDelete, i))?
            .map_err(|e| target.transport(Phase::WaitForDelete, e))?;
        if let OperationStatus::Failed { message } = status {
            return Err(target.failed(Phase::WaitForDelete, message));
        }

        state.id = None;
        state.transition(Lifecycle::Absent);
        info!(kind = %self.kind, id = %id, "Event subscription deleted");
        Ok(())
    }
}
