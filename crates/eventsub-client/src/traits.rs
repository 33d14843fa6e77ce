//! The remote control-plane interface consumed by the reconciler.
//!
//! Authentication, HTTP retries and long-running-operation polling all live
//! behind these traits.

use async_trait::async_trait;
use eventsub_core::EventSubscriptionId;
use eventsub_core::model::EventSubscription;

use crate::error::ClientError;

/// Terminal state of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Succeeded,
    Failed { message: String },
}

/// Handle to a long-running remote mutation.
#[async_trait]
pub trait Operation: Send {
    /// Polls until the operation reaches a terminal state.
    ///
    /// Dropping the returned future stops polling; it does not cancel the
    /// remote operation.
    ///
    /// # Errors
    ///
    /// Returns an error if polling itself fails.
    async fn wait_for_completion(&mut self) -> Result<OperationStatus, ClientError>;
}

/// Client for the event subscription control-plane API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait EventSubscriptionClient: Send + Sync {
    /// Fetches a subscription.
    ///
    /// Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport issues, not for missing resources.
    async fn get(&self, id: &EventSubscriptionId)
        -> Result<Option<EventSubscription>, ClientError>;

    /// Starts a create-or-update of the subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected before an operation starts.
    async fn create_or_update(
        &self,
        id: &EventSubscriptionId,
        subscription: &EventSubscription,
    ) -> Result<Box<dyn Operation>, ClientError>;

    /// Starts deleting the subscription.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the subscription does not exist.
    async fn delete(&self, id: &EventSubscriptionId) -> Result<Box<dyn Operation>, ClientError>;

    /// Fetches the full delivery URL of a webhook destination, which the
    /// service never includes in the stored representation.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the subscription does not exist.
    async fn get_full_url(&self, id: &EventSubscriptionId) -> Result<String, ClientError>;

    /// Returns the name of this client backend for logging.
    fn backend_name(&self) -> &'static str;
}
