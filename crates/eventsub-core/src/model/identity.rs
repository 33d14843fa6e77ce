//! Managed identities and the identity envelope.

use serde::{Deserialize, Serialize};

/// Identity the service uses to authenticate on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceIdentity {
    SystemAssigned,
    UserAssigned {
        #[serde(rename = "userAssignedIdentity")]
        user_assigned_identity: String,
    },
    None,
}

impl ResourceIdentity {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SystemAssigned => "SystemAssigned",
            Self::UserAssigned { .. } => "UserAssigned",
            Self::None => "None",
        }
    }
}

/// An object delivered through a managed identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithResourceIdentity<T> {
    pub identity: ResourceIdentity,
    pub inner: T,
}

/// How a destination (or dead-letter destination) sits in the payload:
/// either directly, or one level deeper inside an identity envelope.
///
/// Having one slot for both shapes makes "envelope and bare field both set"
/// unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement<T> {
    Direct(T),
    WithIdentity(WithResourceIdentity<T>),
}

impl<T> Placement<T> {
    /// Wraps `inner` in an envelope when an identity is given.
    pub fn new(inner: T, identity: Option<ResourceIdentity>) -> Self {
        match identity {
            Some(identity) => Self::WithIdentity(WithResourceIdentity { identity, inner }),
            None => Self::Direct(inner),
        }
    }

    pub fn inner(&self) -> &T {
        match self {
            Self::Direct(inner) => inner,
            Self::WithIdentity(wrapped) => &wrapped.inner,
        }
    }

    pub fn inner_mut(&mut self) -> &mut T {
        match self {
            Self::Direct(inner) => inner,
            Self::WithIdentity(wrapped) => &mut wrapped.inner,
        }
    }

    pub fn identity(&self) -> Option<&ResourceIdentity> {
        match self {
            Self::Direct(_) => None,
            Self::WithIdentity(wrapped) => Some(&wrapped.identity),
        }
    }

    pub fn into_parts(self) -> (T, Option<ResourceIdentity>) {
        match self {
            Self::Direct(inner) => (inner, None),
            Self::WithIdentity(wrapped) => (wrapped.inner, Some(wrapped.identity)),
        }
    }
}
