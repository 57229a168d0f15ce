//! Extraction of embedded records into their own collections.
//!
//! API responses embed associations (`offer.venue`, `offerer.managedVenues`).
//! The normalizer moves every embedded record named by a [`Normalizer`] rule
//! into a pending batch for the rule's collection and leaves only identity
//! references behind in the parent. Sub-rules are not walked here: the
//! orchestrator queues the produced batches and normalizes them in turn.

use crate::collection::{MergeOptions, identify};
use crate::ReconcileResult;
use normstore_model::{ArrayPolicy, DatumPolicy, Identity, MergeConfig, Normalizer, NormalizerRule, Processor};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Entities waiting to be processed, normalized and merged into one
/// collection.
#[derive(Clone)]
pub struct PendingBatch {
    pub collection: String,
    pub entities: Vec<Value>,
    /// Rules applied to `entities` when the batch is processed.
    pub normalizer: Normalizer,
    pub identity: Identity,
    pub policy: DatumPolicy,
    pub array_policy: ArrayPolicy,
    pub processor: Option<Arc<dyn Processor>>,
}

impl PendingBatch {
    /// A top-level patch entry merged with the settings of `config`.
    pub fn root(collection: impl Into<String>, entities: Vec<Value>, config: &MergeConfig) -> Self {
        Self {
            collection: collection.into(),
            entities,
            normalizer: config.normalizer.clone(),
            identity: config.identity.clone(),
            policy: config.policy.clone(),
            array_policy: config.array_policy,
            processor: config.processor.clone(),
        }
    }

    /// An empty batch for records extracted by `rule`. Settings the rule
    /// leaves unset come from `config`.
    pub fn for_rule(rule: &NormalizerRule, config: &MergeConfig) -> Self {
        Self {
            collection: rule.collection.clone(),
            entities: Vec::new(),
            normalizer: rule.normalizer.clone(),
            identity: rule.identity.clone().unwrap_or_else(|| config.identity.clone()),
            policy: rule.policy.clone().unwrap_or_else(|| config.policy.clone()),
            array_policy: rule.array_policy.unwrap_or(config.array_policy),
            processor: rule.processor.clone(),
        }
    }

    pub fn options(&self, strict_identity: bool) -> MergeOptions<'_> {
        MergeOptions {
            collection: &self.collection,
            identity: &self.identity,
            policy: &self.policy,
            array_policy: self.array_policy,
            strict_identity,
        }
    }
}

/// Parent entities with references in place of embedded records, plus one
/// batch per rule that extracted anything.
pub struct Normalized {
    pub entities: Vec<Value>,
    pub nested: Vec<PendingBatch>,
}

/// Peels the records embedded in `entities` according to `normalizer`.
///
/// A rule field holding an object is replaced by that object's identity
/// value; a field holding an array becomes an array where every object is
/// replaced by its identity value. Scalars and `null` are references
/// already and stay as they are. Records extracted by the same rule from
/// different parents land in one batch, in parent order.
pub fn normalize(
    collection: &str,
    mut entities: Vec<Value>,
    normalizer: &Normalizer,
    config: &MergeConfig,
) -> ReconcileResult<Normalized> {
    if normalizer.is_empty() {
        return Ok(Normalized {
            entities,
            nested: Vec::new(),
        });
    }

    let mut nested: Vec<PendingBatch> = normalizer
        .iter()
        .map(|(_, rule)| PendingBatch::for_rule(rule, config))
        .collect();

    for entity in &mut entities {
        let Some(fields) = entity.as_object_mut() else {
            continue;
        };
        for ((field, _), batch) in normalizer.iter().zip(nested.iter_mut()) {
            let Some(slot) = fields.get_mut(field.as_str()) else {
                continue;
            };
            extract(slot, batch, config.strict_identity)?;
        }
    }

    nested.retain(|batch| !batch.entities.is_empty());
    if !nested.is_empty() {
        debug!(
            "normalized {}: extracted into {:?}",
            collection,
            nested.iter().map(|batch| batch.collection.as_str()).collect::<Vec<_>>()
        );
    }

    Ok(Normalized { entities, nested })
}

fn extract(slot: &mut Value, batch: &mut PendingBatch, strict: bool) -> ReconcileResult<()> {
    match slot.take() {
        record @ Value::Object(_) => {
            *slot = reference(&record, batch, strict)?;
            batch.entities.push(record);
        }
        Value::Array(items) => {
            let mut references = Vec::with_capacity(items.len());
            for item in items {
                if item.is_object() {
                    references.push(reference(&item, batch, strict)?);
                    batch.entities.push(item);
                } else {
                    references.push(item);
                }
            }
            *slot = Value::Array(references);
        }
        reference => *slot = reference,
    }
    Ok(())
}

fn reference(record: &Value, batch: &PendingBatch, strict: bool) -> ReconcileResult<Value> {
    Ok(identify(record, &batch.identity, strict, &batch.collection)?.unwrap_or(Value::Null))
}
