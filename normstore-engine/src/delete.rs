//! Removing entities from a store by identity.

use crate::collection::{identify, index_key};
use crate::ReconcileResult;
use normstore_model::MergeConfig;
use normstore_types::{Patch, Store};
use std::collections::HashSet;
use tracing::debug;

/// Removes the entities named by `patch` and returns the next store.
///
/// Patch entries are run through the config's processor and reduced to
/// identity values; an entry that is not an object is taken as the identity
/// value itself. Deleting from a collection `state` does not have is a
/// no-op and leaves it absent. A collection that loses nothing stays shared
/// with `state`.
pub fn delete_from_state(state: &Store, patch: &Patch, config: &MergeConfig) -> ReconcileResult<Store> {
    let mut next = state.clone();

    for (name, entities) in patch {
        let Some(current) = state.get(name) else {
            debug!("delete from absent collection {} ignored", name);
            continue;
        };

        let entities = match &config.processor {
            Some(processor) => processor.process(name, entities.clone()),
            None => entities.clone(),
        };

        let mut doomed = HashSet::with_capacity(entities.len());
        for entity in &entities {
            let id = if entity.is_object() {
                identify(entity, &config.identity, config.strict_identity, name)?
            } else {
                Some(entity.clone())
            };
            doomed.insert(index_key(id));
        }

        let remaining: Vec<_> = current
            .iter()
            .filter(|datum| !doomed.contains(&index_key(config.identity.value_of(datum))))
            .cloned()
            .collect();

        if remaining.len() != current.len() {
            debug!("deleted {} entities from {}", current.len() - remaining.len(), name);
            next.insert(name.as_str(), remaining);
        }
    }

    Ok(next)
}
