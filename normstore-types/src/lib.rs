//! Core type definitions for normstore.
//!
//! This crate defines the plain data the reconciliation engine works on:
//! - [`Store`]: the flat, per-collection entity cache
//! - [`Patch`]: a partial, store-shaped payload of raw entities
//! - [`Commit`]: one pending local mutation, identified by a [`CommitId`]
//! - [`Timestamp`]: hybrid logical clock used to order commits
//!
//! Entities themselves are untyped JSON records (`serde_json::Value`); the
//! identity and merge rules that apply to them live in `normstore-model`.

mod commit;
mod ids;
mod store;
mod timestamp;

pub use commit::Commit;
pub use ids::CommitId;
pub use store::{Collection, Patch, Store};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or decoding store types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid patch: {0}")]
    InvalidPatch(String),
}
