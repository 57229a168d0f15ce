//! Merging patches into a store.
//!
//! Every patch entry becomes a [`PendingBatch`] on a FIFO worklist. Each
//! batch is processed, normalized (queueing the batches it extracts) and
//! merged into its collection. Nesting depth only grows the queue, never
//! the call stack.

use crate::collection::{MergeOptions, merge_collection, merge_collection_into};
use crate::normalize::{Normalized, PendingBatch, normalize};
use crate::ReconcileResult;
use normstore_model::{ArrayPolicy, MergeConfig};
use normstore_types::{Patch, Store};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Merges `patch` into `state` and returns the next store.
///
/// `state` is left untouched. Collections no batch writes to are shared
/// with `state`; every written collection is a fresh allocation.
pub fn merge_into_state(state: &Store, patch: &Patch, config: &MergeConfig) -> ReconcileResult<Store> {
    let roots = patch
        .iter()
        .filter(|(_, entities)| !entities.is_empty())
        .map(|(name, entities)| PendingBatch::root(name.as_str(), entities.clone(), config))
        .collect();

    drain_worklist(state, roots, config)
}

/// Runs the worklist seeded with `roots` against `state`.
pub(crate) fn drain_worklist(
    state: &Store,
    roots: Vec<PendingBatch>,
    config: &MergeConfig,
) -> ReconcileResult<Store> {
    let mut queue: VecDeque<PendingBatch> = roots.into();
    let mut written: BTreeMap<String, Vec<Value>> = BTreeMap::new();

    while let Some(mut batch) = queue.pop_front() {
        let raw = std::mem::take(&mut batch.entities);
        let processed = match &batch.processor {
            Some(processor) => processor.process(&batch.collection, raw),
            None => raw,
        };
        if processed.is_empty() {
            continue;
        }

        let Normalized { entities, nested } =
            normalize(&batch.collection, processed, &batch.normalizer, config)?;
        queue.extend(nested);

        debug!("merging {} entities into {}", entities.len(), batch.collection);
        let options = batch.options(config.strict_identity);
        match written.get_mut(&batch.collection) {
            // Replace applies to the cached collection, not to earlier
            // batches of the same drain.
            Some(working) => {
                let options = MergeOptions {
                    array_policy: ArrayPolicy::Merge,
                    ..options
                };
                merge_collection_into(entities, working, &options)?
            }
            None => {
                let previous = state.get(&batch.collection).map(|entities| entities.as_slice());
                let merged = merge_collection(entities, previous, &options)?;
                written.insert(batch.collection.clone(), merged);
            }
        }
    }

    let mut next = state.clone();
    for (name, entities) in written {
        next.insert(name, entities);
    }
    Ok(next)
}
