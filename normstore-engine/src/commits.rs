//! Folding pending commits over server state.
//!
//! The optimistic view of a collection that any commit targets is the
//! replay of its commit log alone; server data for that collection is not
//! carried over. Collections no commit targets pass through unchanged.

use crate::normalize::PendingBatch;
use crate::state::drain_worklist;
use crate::ReconcileResult;
use normstore_model::{ArrayPolicy, DatumPolicy, FoldConfig, Identity};
use normstore_types::{Commit, CommitId, Store, Timestamp};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Field holding the commit uuid in a folded record. Folded records are
/// paired by this field, not by the entity identity.
pub const UUID_FIELD: &str = "uuid";
/// Field holding the `date_created` of the first live commit of a uuid.
pub const FIRST_DATE_CREATED_FIELD: &str = "first_date_created";
/// Field holding the `date_created` of the latest commit folded in.
pub const LAST_DATE_CREATED_FIELD: &str = "last_date_created";

/// Replays `commits` on top of `server_state`.
///
/// Removed commits are skipped. Live ones are folded in ascending
/// `date_created` order (input order breaks ties), each as a deep merge of
/// `{first_date_created, last_date_created, uuid, ..patch, ..kept}` keyed by
/// uuid, so commits sharing a uuid accumulate into one record.
pub fn fold_commits(
    server_state: &Store,
    commits: &[Commit],
    config: &FoldConfig,
) -> ReconcileResult<Store> {
    let touched: BTreeSet<&str> = commits
        .iter()
        .map(|commit| commit.collection_name.as_str())
        .collect();

    let mut state = server_state.clone();
    state.retain(|name| !touched.contains(name));

    let mut live: Vec<&Commit> = commits.iter().filter(|commit| !commit.is_removed).collect();
    live.sort_by_key(|commit| commit.date_created);

    let mut first_created: HashMap<CommitId, Timestamp> = HashMap::new();
    for commit in &live {
        first_created.entry(commit.uuid).or_insert(commit.date_created);
    }

    debug!(
        "folding {} live commits ({} removed) over {} collections",
        live.len(),
        commits.len() - live.len(),
        touched.len()
    );

    for commit in live {
        let first = first_created
            .get(&commit.uuid)
            .copied()
            .unwrap_or(commit.date_created);
        let record = pending_record(commit, first, config)?;

        let mut batch = PendingBatch::root(commit.collection_name.as_str(), vec![record], &config.merge);
        batch.identity = Identity::field(UUID_FIELD);
        batch.policy = DatumPolicy::Deep;
        batch.array_policy = ArrayPolicy::Merge;

        state = drain_worklist(&state, vec![batch], &config.merge)?;
    }

    Ok(state)
}

fn pending_record(commit: &Commit, first: Timestamp, config: &FoldConfig) -> ReconcileResult<Value> {
    let mut record = Map::new();
    record.insert(FIRST_DATE_CREATED_FIELD.into(), serde_json::to_value(first)?);
    record.insert(LAST_DATE_CREATED_FIELD.into(), serde_json::to_value(commit.date_created)?);
    record.insert(UUID_FIELD.into(), serde_json::to_value(commit.uuid)?);
    record.extend(commit.patch.clone());
    record.extend(config.keep.keep(commit));
    Ok(Value::Object(record))
}
