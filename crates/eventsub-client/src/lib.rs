//! # eventsub-client
//!
//! The remote control-plane interface the reconciler is written against,
//! plus an in-memory implementation used by tests and the CLI.
//!
//! ## Example
//!
//! ```ignore
//! use eventsub_client::{EventSubscriptionClient, InMemoryClient};
//!
//! let client = InMemoryClient::new();
//! let existing = client.get(&id).await?;
//! ```

mod error;
pub mod memory;
mod traits;

pub use error::{ClientError, ErrorCategory};
pub use memory::{Fault, InMemoryClient, StoredSubscription};
pub use traits::{EventSubscriptionClient, Operation, OperationStatus};

/// Type alias for a shareable client instance.
pub type DynClient = std::sync::Arc<dyn EventSubscriptionClient>;
