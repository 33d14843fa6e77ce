//! Errors raised while reconciling an event subscription.
//!
//! Every variant carries enough context (resource kind, name, scope and the
//! phase that failed) for an operator to act on it without reading logs.

use std::fmt;

use eventsub_client::ClientError;
use eventsub_core::{CoreError, ResourceKind, ValidationError};

/// The step of a reconciliation an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ExistenceCheck,
    Write,
    WaitForWrite,
    ReadBack,
    Read,
    FullUrl,
    Delete,
    WaitForDelete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExistenceCheck => "checking for presence of existing",
            Self::Write => "creating/updating",
            Self::WaitForWrite => "waiting for creation/update of",
            Self::ReadBack => "retrieving",
            Self::Read => "reading",
            Self::FullUrl => "retrieving full endpoint URL of",
            Self::Delete => "deleting",
            Self::WaitForDelete => "waiting for deletion of",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The flat configuration is invalid. No remote call was made.
    #[error("expanding {kind} {name:?}: {source}")]
    Validation {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ValidationError,
    },

    /// A resource already exists where a new one was about to be created.
    #[error(
        "a resource with the ID {existing_id:?} already exists - to be managed it needs to be imported into the state ({kind})"
    )]
    ImportCollision {
        kind: ResourceKind,
        existing_id: String,
    },

    #[error("{phase} {kind} {name:?} ({scope}): {source}")]
    RemoteTransport {
        kind: ResourceKind,
        name: String,
        scope: String,
        phase: Phase,
        #[source]
        source: ClientError,
    },

    /// The long-running operation reached a failed terminal state.
    #[error("{phase} {kind} {name:?} ({scope}): operation failed: {message}")]
    OperationFailed {
        kind: ResourceKind,
        name: String,
        scope: String,
        phase: Phase,
        message: String,
    },

    /// The resource vanished before a delete could remove it.
    #[error("deleting {kind} {id:?}: resource was not found")]
    DriftNotFound { kind: ResourceKind, id: String },

    /// The service reported success but the resource does not read back
    /// correctly.
    #[error("{kind} {name:?} ({scope}): {message}")]
    InconsistentState {
        kind: ResourceKind,
        name: String,
        scope: String,
        message: String,
    },

    /// Waiting was cut short; the remote operation may or may not have
    /// completed. Safe to retry, nothing was rolled back.
    #[error("{phase} {kind} {name:?} ({scope}): outcome unknown: {reason}")]
    OutcomeUnknown {
        kind: ResourceKind,
        name: String,
        scope: String,
        phase: Phase,
        reason: String,
    },

    #[error(transparent)]
    InvalidId(#[from] CoreError),
}

/// Error category for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    Remote,
    Drift,
    Timeout,
}

impl ReconcileError {
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Self::Validation { kind, .. }
            | Self::ImportCollision { kind, .. }
            | Self::RemoteTransport { kind, .. }
            | Self::OperationFailed { kind, .. }
            | Self::DriftNotFound { kind, .. }
            | Self::InconsistentState { kind, .. }
            | Self::OutcomeUnknown { kind, .. } => Some(*kind),
            Self::InvalidId(_) => None,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::RemoteTransport { phase, .. }
            | Self::OperationFailed { phase, .. }
            | Self::OutcomeUnknown { phase, .. } => Some(*phase),
            Self::ImportCollision { .. } => Some(Phase::ExistenceCheck),
            Self::DriftNotFound { .. } => Some(Phase::Delete),
            Self::InconsistentState { .. } => Some(Phase::ReadBack),
            Self::Validation { .. } | Self::InvalidId(_) => None,
        }
    }

    /// Whether running the same operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OutcomeUnknown { .. } => true,
            Self::RemoteTransport { source, .. } => matches!(source, ClientError::Transport { .. }),
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidId(_))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::InvalidId(_) => ErrorCategory::Validation,
            Self::ImportCollision { .. } => ErrorCategory::Conflict,
            Self::RemoteTransport { .. } | Self::OperationFailed { .. } => ErrorCategory::Remote,
            Self::DriftNotFound { .. } | Self::InconsistentState { .. } => ErrorCategory::Drift,
            Self::OutcomeUnknown { .. } => ErrorCategory::Timeout,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_unknown_is_retryable() {
        let err = ReconcileError::OutcomeUnknown {
            kind: ResourceKind::SystemTopicEventSubscription,
            name: "sub1".into(),
            scope: "topic1".into(),
            phase: Phase::WaitForWrite,
            reason: "deadline exceeded".into(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert_eq!(err.phase(), Some(Phase::WaitForWrite));
        assert_eq!(
            err.to_string(),
            "waiting for creation/update of eventgrid_system_topic_event_subscription \"sub1\" (topic1): outcome unknown: deadline exceeded"
        );
    }

    #[test]
    fn test_import_collision_names_existing_id() {
        let err = ReconcileError::ImportCollision {
            kind: ResourceKind::EventSubscription,
            existing_id: "/subscriptions/0000/providers/Microsoft.EventGrid/eventSubscriptions/sub1"
                .into(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("needs to be imported"));
        assert!(err.to_string().contains("eventSubscriptions/sub1"));
    }

    #[test]
    fn test_transport_errors_are_retryable_failures_are_not() {
        let transport = ReconcileError::RemoteTransport {
            kind: ResourceKind::EventSubscription,
            name: "sub1".into(),
            scope: "/subscriptions/0000".into(),
            phase: Phase::Write,
            source: ClientError::transport("connection reset"),
        };
        assert!(transport.is_retryable());

        let failed = ReconcileError::OperationFailed {
            kind: ResourceKind::EventSubscription,
            name: "sub1".into(),
            scope: "/subscriptions/0000".into(),
            phase: Phase::WaitForWrite,
            message: "quota exceeded".into(),
        };
        assert!(!failed.is_retryable());
        assert_eq!(failed.category(), ErrorCategory::Remote);
    }

    #[test]
    fn test_validation_category() {
        let err = ReconcileError::Validation {
            kind: ResourceKind::EventSubscription,
            name: "sub1".into(),
            source: ValidationError::new("advanced_filter[0]", "needs a value"),
        };
        assert!(err.is_validation());
        assert!(err.phase().is_none());
    }
}
