//! Store reducer.
//!
//! Front door for applications that keep one store and feed it actions as
//! requests settle: merge a response, delete entities, assign a collection
//! wholesale, reset, or rebuild the optimistic view from a commit log.

use crate::{ReconcileResult, delete_from_state, fold_commits, merge_into_state};
use normstore_model::{FoldConfig, MergeConfig};
use normstore_types::{Commit, Patch, Store};
use tracing::debug;

/// A change to apply to a [`Store`].
#[derive(Debug, Clone)]
pub enum StoreAction {
    /// Merge a server payload.
    Merge { patch: Patch, config: MergeConfig },
    /// Remove the entities named in the patch.
    Delete { patch: Patch, config: MergeConfig },
    /// Replace each named collection with the given entities, unmerged.
    Assign { patch: Patch },
    /// Drop every collection except the listed ones.
    Reset { keep: Vec<String> },
    /// Fold pending commits over the store.
    FoldCommits { commits: Vec<Commit>, config: FoldConfig },
}

impl StoreAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Merge { .. } => "merge",
            Self::Delete { .. } => "delete",
            Self::Assign { .. } => "assign",
            Self::Reset { .. } => "reset",
            Self::FoldCommits { .. } => "fold_commits",
        }
    }
}

/// Applies `action` to `state` and returns the next store.
pub fn reduce(state: &Store, action: &StoreAction) -> ReconcileResult<Store> {
    debug!("reducing {} action", action.name());

    match action {
        StoreAction::Merge { patch, config } => merge_into_state(state, patch, config),
        StoreAction::Delete { patch, config } => delete_from_state(state, patch, config),
        StoreAction::Assign { patch } => {
            let mut next = state.clone();
            for (name, entities) in patch {
                next.insert(name.as_str(), entities.clone());
            }
            Ok(next)
        }
        StoreAction::Reset { keep } => {
            let mut next = state.clone();
            next.retain(|name| keep.iter().any(|kept| kept == name));
            Ok(next)
        }
        StoreAction::FoldCommits { commits, config } => fold_commits(state, commits, config),
    }
}
