//! Identity-based merge of one collection.
//!
//! Incoming entities are paired with cached ones by identity value. A match
//! keeps its position; an unmatched entity is appended at the end. Merging
//! never removes entities.

use crate::{ReconcileError, ReconcileResult};
use normstore_model::{ArrayPolicy, DatumPolicy, Identity, MergeConfig, ResolveContext};
use serde_json::Value;
use std::collections::HashMap;
use tracing::trace;

/// Settings for merging one batch into one collection.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions<'a> {
    pub collection: &'a str,
    pub identity: &'a Identity,
    pub policy: &'a DatumPolicy,
    pub array_policy: ArrayPolicy,
    pub strict_identity: bool,
}

impl<'a> MergeOptions<'a> {
    /// Top-level options of `config` for `collection`.
    pub fn new(collection: &'a str, config: &'a MergeConfig) -> Self {
        Self {
            collection,
            identity: &config.identity,
            policy: &config.policy,
            array_policy: config.array_policy,
            strict_identity: config.strict_identity,
        }
    }
}

/// Merges `next` into `previous` and returns the new collection.
///
/// With no previous collection (or [`ArrayPolicy::Replace`]) `next` is the
/// result as is; only entities repeating an identity within `next` are
/// merged onto their first occurrence. Otherwise the result starts as a copy
/// of `previous` and each entity of `next` is merged by identity.
pub fn merge_collection(
    next: Vec<Value>,
    previous: Option<&[Value]>,
    options: &MergeOptions<'_>,
) -> ReconcileResult<Vec<Value>> {
    match previous {
        Some(previous) if options.array_policy == ArrayPolicy::Merge => {
            let mut merged = previous.to_vec();
            merge_collection_into(next, &mut merged, options)?;
            Ok(merged)
        }
        _ => first_write(next, options),
    }
}

/// In-place variant of [`merge_collection`].
///
/// Mutates `target` directly instead of copying it first. Anything else
/// holding on to `target` observes the merge; use it only on a vector the
/// caller exclusively owns.
pub fn merge_collection_into(
    next: Vec<Value>,
    target: &mut Vec<Value>,
    options: &MergeOptions<'_>,
) -> ReconcileResult<()> {
    if options.array_policy == ArrayPolicy::Replace {
        *target = first_write(next, options)?;
        return Ok(());
    }

    let mut index = build_index(target, options.identity);
    let (mut updated, mut appended) = (0usize, 0usize);

    for datum in next {
        let key = index_key(identify(&datum, options.identity, options.strict_identity, options.collection)?);
        match index.get(&key).copied() {
            Some(position) => {
                let merged = merge_datum(datum, Some(&target[position]), options);
                target[position] = merged;
                updated += 1;
            }
            None => {
                let merged = merge_datum(datum, None, options);
                index.insert(key, target.len());
                target.push(merged);
                appended += 1;
            }
        }
    }

    trace!(
        "merged into {}: {} updated, {} appended",
        options.collection, updated, appended
    );
    Ok(())
}

fn first_write(next: Vec<Value>, options: &MergeOptions<'_>) -> ReconcileResult<Vec<Value>> {
    let mut merged: Vec<Value> = Vec::with_capacity(next.len());
    let mut index = HashMap::with_capacity(next.len());

    for datum in next {
        let key = index_key(identify(&datum, options.identity, options.strict_identity, options.collection)?);
        match index.get(&key).copied() {
            Some(position) => {
                let combined = merge_datum(datum, Some(&merged[position]), options);
                merged[position] = combined;
            }
            None => {
                index.insert(key, merged.len());
                merged.push(datum);
            }
        }
    }
    Ok(merged)
}

/// Computes the value stored for `next` given the cached entity, if any.
pub fn merge_datum(next: Value, previous: Option<&Value>, options: &MergeOptions<'_>) -> Value {
    match options.policy {
        DatumPolicy::Resolve(resolver) => {
            let ctx = ResolveContext {
                collection: options.collection,
                identity: options.identity,
            };
            resolver.resolve(&next, previous, &ctx)
        }
        DatumPolicy::Shallow { merging: true } => match (previous, next) {
            (Some(Value::Object(previous)), Value::Object(next)) => {
                let mut merged = previous.clone();
                merged.extend(next);
                Value::Object(merged)
            }
            (_, next) => next,
        },
        DatumPolicy::Deep => match previous {
            Some(previous) => deep_merge(previous.clone(), next),
            None => next,
        },
        DatumPolicy::Shallow { merging: false } | DatumPolicy::Replace => next,
    }
}

/// Recursively merges `next` over `previous`.
///
/// Objects merge key by key, keys missing from `next` keep their previous
/// value. Any other value in `next` (arrays included) replaces the previous
/// one.
pub fn deep_merge(previous: Value, next: Value) -> Value {
    match (previous, next) {
        (Value::Object(mut merged), Value::Object(next)) => {
            for (key, value) in next {
                let combined = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, combined);
            }
            Value::Object(merged)
        }
        (_, next) => next,
    }
}

/// Reads the identity of an incoming entity, enforcing strict identity.
pub(crate) fn identify(
    datum: &Value,
    identity: &Identity,
    strict: bool,
    collection: &str,
) -> ReconcileResult<Option<Value>> {
    let id = identity.value_of(datum);
    if id.is_none() && strict {
        let collection = collection.to_string();
        return Err(if datum.is_object() {
            ReconcileError::MissingIdentityKey { collection }
        } else {
            ReconcileError::NotAnEntity { collection }
        });
    }
    Ok(id)
}

/// Hashable form of an identity value. `None` is a key of its own, so
/// entities without identity share one slot.
pub(crate) fn index_key(id: Option<Value>) -> Option<String> {
    id.map(|value| value.to_string())
}

fn build_index(entities: &[Value], identity: &Identity) -> HashMap<Option<String>, usize> {
    let mut index = HashMap::with_capacity(entities.len());
    for (position, datum) in entities.iter().enumerate() {
        index
            .entry(index_key(identity.value_of(datum)))
            .or_insert(position);
    }
    index
}
