//! Configuration surface for EventSub.
//!
//! - [`FlatConfig`]: the flat, user-authored desired state of one event
//!   subscription, deserialised from a TOML manifest
//! - [`SchemaRegistry`]: field declarations shared by the sibling resource
//!   kinds (names, types, conflicts, allowed values)
//! - [`Settings`]: process settings layered from a file and `EVENTSUB__*`
//!   environment variables

pub mod flat;
pub mod manifest;
pub mod schema;
pub mod settings;
mod validate;

pub use flat::{
    AdvancedFilterEntry, AzureFunctionEndpoint, FilterValue, FlatConfig, IdentityBlock,
    IdentityType, RetryPolicyBlock, StorageBlobDeadLetterBlock, StorageQueueEndpoint,
    SubjectFilter, WebhookEndpoint,
};
pub use manifest::{load_manifest, parse_manifest, to_toml};
pub use schema::{DESTINATION_FIELDS, FieldSpec, FieldType, Presence, SchemaRegistry};
pub use settings::{LoggingSettings, Settings, TimeoutSettings, load_settings};

use eventsub_core::ValidationError;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid field {0}")]
    Field(#[from] ValidationError),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
