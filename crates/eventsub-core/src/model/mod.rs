//! Remote representation of an event subscription.
//!
//! Every polymorphic part of the payload is a sum type, so adding a variant
//! forces both the expanders and the flattener to handle it.

pub mod dead_letter;
pub mod destination;
pub mod filter;
pub mod identity;
pub mod properties;

pub use dead_letter::{DeadLetterDestination, StorageBlobDeadLetterDestination};
pub use destination::{
    AzureFunctionDestination, Destination, ResourceDestination, StorageQueueDestination,
    WebHookDestination,
};
pub use filter::{AdvancedFilter, AdvancedFilterOperator, Filter};
pub use identity::{Placement, ResourceIdentity, WithResourceIdentity};
pub use properties::{
    EventDeliverySchema, EventSubscription, ProvisioningState, RetryPolicy,
    SubscriptionProperties,
};
