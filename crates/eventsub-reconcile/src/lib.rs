//! # eventsub-reconcile
//!
//! Maps the flat configuration of an event subscription onto the remote
//! model and back, and drives the resource through its remote lifecycle.
//!
//! - [`expand`]: one pure expander per polymorphic part of the payload
//! - [`assemble_properties`]: composes the expanders into a write payload
//! - [`flatten_subscription`]: the inverse, total over any remote payload
//! - [`Reconciler`]: create/read/update/delete against an
//!   [`EventSubscriptionClient`](eventsub_client::EventSubscriptionClient)
//!
//! ## Example
//!
//! ```ignore
//! let reconciler = Reconciler::new(client, ResourceKind::SystemTopicEventSubscription, "0000");
//! let ctx = OperationContext::with_timeout(settings.timeouts.create());
//! let mut state = ResourceState::new();
//! let applied = reconciler.create_or_update(&ctx, &config, &mut state).await?;
//! ```

mod assemble;
mod context;
mod error;
pub mod expand;
mod flatten;
mod reconciler;

pub use assemble::{assemble_properties, expand_expiration, expand_retry_policy};
pub use context::{Interrupted, OperationContext};
pub use error::{ErrorCategory, Phase, ReconcileError, Result};
pub use flatten::flatten_subscription;
pub use reconciler::{Lifecycle, Plan, Reconciler, ResourceState};
