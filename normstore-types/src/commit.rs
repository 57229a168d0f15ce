//! Pending local mutations.
//!
//! A commit records one optimistic edit that the server has not confirmed
//! yet. The engine replays the commit log on top of server state so the UI
//! can show the edit before the round-trip completes.

use crate::{CommitId, Error, Result, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One pending mutation of an entity in `collection_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Logical edit this commit belongs to. Shared by successive commits of
    /// the same edit.
    pub uuid: CommitId,

    /// Collection the edited entity lives in.
    pub collection_name: String,

    /// Partial entity fields written by this commit.
    #[serde(default)]
    pub patch: Map<String, Value>,

    /// When the commit was created. Folding order.
    pub date_created: Timestamp,

    /// Cancelled before the next fold. Contributes nothing.
    #[serde(default)]
    pub is_removed: bool,
}

impl Commit {
    /// Creates a live commit from an object-shaped patch.
    pub fn new(
        uuid: CommitId,
        collection_name: impl Into<String>,
        date_created: Timestamp,
        patch: Value,
    ) -> Result<Self> {
        let collection_name = collection_name.into();
        let Value::Object(patch) = patch else {
            return Err(Error::InvalidPatch(format!(
                "commit patch for `{collection_name}` must be an object"
            )));
        };

        Ok(Self {
            uuid,
            collection_name,
            patch,
            date_created,
            is_removed: false,
        })
    }

    /// Marks this commit as cancelled.
    #[must_use]
    pub fn removed(mut self) -> Self {
        self.is_removed = true;
        self
    }

    /// Decodes a commit from its JSON form.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
