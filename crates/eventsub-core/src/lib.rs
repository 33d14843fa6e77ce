//! # eventsub-core
//!
//! Shared building blocks for EventSub: the remote event subscription model,
//! resource identifiers, timestamp helpers and the error types every other
//! crate builds on.

pub mod error;
pub mod id;
pub mod model;
pub mod time;

pub use error::{CoreError, ErrorCategory, Result, ValidationError};
pub use id::{EventSubscriptionId, ResourceKind, SubscriptionScope};
pub use crate::time::{format_rfc3339, parse_rfc3339};
