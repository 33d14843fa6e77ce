//! Flat configuration to remote model.
//!
//! Each expander is pure and handles one polymorphic part of the payload.

mod dead_letter;
mod destination;
mod filter;
mod identity;

pub use dead_letter::expand_dead_letter;
pub use destination::{DESTINATION_PRIORITY, expand_destination};
pub use filter::{MAX_FILTER_VALUES, expand_advanced_filter, expand_filter};
pub use identity::expand_identity;
