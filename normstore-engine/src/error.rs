//! Error types for the reconciliation engine.

use thiserror::Error;

/// Result type for engine operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that can occur while reconciling a store.
///
/// The engine does not validate entity shapes. The only checks it performs
/// are the ones a caller opts into with `MergeConfig::strict_identity`.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// An entity has no identity value and strict identity is on.
    #[error("entity in `{collection}` has no identity value")]
    MissingIdentityKey { collection: String },

    /// Strict identity found something other than a JSON object where an
    /// entity was expected.
    #[error("non-object entry in `{collection}` cannot be identified")]
    NotAnEntity { collection: String },

    /// Encoding commit metadata failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Building a store type failed.
    #[error(transparent)]
    Types(#[from] normstore_types::Error),
}
