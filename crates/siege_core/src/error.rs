//! Error types for the siege engine.
//!
//! Most failures inside the engine are expected noise (a spawn into an
//! unloaded region, a query that times out) and are swallowed at the call
//! site. These types exist so the host boundary and data loading can still
//! describe what went wrong.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`SiegeError`].
pub type Result<T> = std::result::Result<T, SiegeError>;

/// Top-level error type for the siege engine.
#[derive(Debug, Error)]
pub enum SiegeError {
    /// The host refused or failed to spawn a unit.
    #[error("Failed to spawn '{entity_type}': {reason}")]
    SpawnFailed {
        /// Entity type that was requested.
        entity_type: String,
        /// Host-provided reason.
        reason: String,
    },

    /// The host could not attach a tag.
    #[error("Failed to tag entity {entity} with '{tag}': {reason}")]
    TagFailed {
        /// Entity that was being tagged.
        entity: EntityId,
        /// Tag that was requested.
        tag: String,
        /// Host-provided reason.
        reason: String,
    },

    /// A world query could not be answered.
    #[error("World query for tag '{tag}' failed: {reason}")]
    QueryFailed {
        /// Tag that was queried.
        tag: String,
        /// Host-provided reason.
        reason: String,
    },

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the file or embedded source that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// A wave catalog broke one of its structural rules.
    #[error("Invalid wave catalog: {0}")]
    InvalidCatalog(String),

    /// Snapshot encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
