use crate::Identity;
use normstore_types::Commit;
use serde_json::{Map, Value};

/// Field that [`Tagger`] appends its tag to.
pub const TAGS_FIELD: &str = "__tags__";

/// What a [`Resolver`] knows about the merge it is resolving.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Collection the entity is being merged into.
    pub collection: &'a str,
    /// Identity used to pair `next` with `previous`.
    pub identity: &'a Identity,
}

/// Custom merge of one entity, used by `DatumPolicy::Resolve`.
///
/// The engine defers entirely to the resolver: whatever it returns is stored
/// at the entity's position. `previous` is `None` when the entity is new.
pub trait Resolver: Send + Sync {
    fn resolve(&self, next: &Value, previous: Option<&Value>, ctx: &ResolveContext<'_>) -> Value;
}

impl<F> Resolver for F
where
    F: Fn(&Value, Option<&Value>, &ResolveContext<'_>) -> Value + Send + Sync,
{
    fn resolve(&self, next: &Value, previous: Option<&Value>, ctx: &ResolveContext<'_>) -> Value {
        self(next, previous, ctx)
    }
}

/// Pre-processing step run on a batch of raw entities before it is
/// normalized and merged.
///
/// Typical uses are renaming server fields, computing derived fields, or
/// tagging entities with the request that produced them. Implementations
/// must be pure: the same input gives the same output.
pub trait Processor: Send + Sync {
    fn process(&self, collection: &str, entities: Vec<Value>) -> Vec<Value>;
}

impl<F> Processor for F
where
    F: Fn(&str, Vec<Value>) -> Vec<Value> + Send + Sync,
{
    fn process(&self, collection: &str, entities: Vec<Value>) -> Vec<Value> {
        self(collection, entities)
    }
}

/// Selects which raw commit fields are copied verbatim into the folded
/// pending record. Keeps nothing by default.
pub trait KeepFromCommit: Send + Sync {
    fn keep(&self, _commit: &Commit) -> Map<String, Value> {
        Map::new()
    }
}

impl<F> KeepFromCommit for F
where
    F: Fn(&Commit) -> Map<String, Value> + Send + Sync,
{
    fn keep(&self, commit: &Commit) -> Map<String, Value> {
        self(commit)
    }
}

/// The default [`KeepFromCommit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepNothing;

impl KeepFromCommit for KeepNothing {}

/// Processor that records a tag on every object entity of a batch.
///
/// The tag is appended once to the entity's [`TAGS_FIELD`] array, which is
/// created when missing. Non-object entities pass through untouched.
#[derive(Debug, Clone)]
pub struct Tagger {
    tag: String,
}

impl Tagger {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Processor for Tagger {
    fn process(&self, _collection: &str, mut entities: Vec<Value>) -> Vec<Value> {
        for entity in &mut entities {
            let Some(fields) = entity.as_object_mut() else {
                continue;
            };
            let tags = fields
                .entry(TAGS_FIELD)
                .or_insert_with(|| Value::Array(Vec::new()));
            if !tags.is_array() {
                *tags = Value::Array(Vec::new());
            }
            if let Value::Array(tags) = tags {
                let tag = Value::String(self.tag.clone());
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        entities
    }
}
