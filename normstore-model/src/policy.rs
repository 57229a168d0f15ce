use crate::{ResolveContext, Resolver};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// How an incoming entity is combined with the cached entity of the same
/// identity.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatumPolicy {
    /// The incoming entity replaces the cached one entirely (default).
    #[default]
    Replace,
    /// One-level overwrite. With `merging`, cached fields the incoming
    /// entity does not carry survive; without it the result is exactly the
    /// incoming entity.
    Shallow {
        #[serde(default)]
        merging: bool,
    },
    /// Recursive field-by-field merge of nested objects. Arrays and scalars
    /// in the incoming entity replace cached ones.
    Deep,
    /// A call-site resolver decides. Has no JSON form.
    #[serde(skip)]
    Resolve(Arc<dyn Resolver>),
}

impl DatumPolicy {
    /// Shallow overwrite that keeps cached fields absent from the update.
    pub fn shallow_merging() -> Self {
        Self::Shallow { merging: true }
    }

    pub fn resolver(resolver: impl Resolver + 'static) -> Self {
        Self::Resolve(Arc::new(resolver))
    }

    /// Resolve with a closure.
    pub fn resolve_with<F>(resolve: F) -> Self
    where
        F: Fn(&Value, Option<&Value>, &ResolveContext<'_>) -> Value + Send + Sync + 'static,
    {
        Self::Resolve(Arc::new(resolve))
    }

    pub fn is_resolve(&self) -> bool {
        matches!(self, Self::Resolve(_))
    }
}

impl fmt::Debug for DatumPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("Replace"),
            Self::Shallow { merging } => f.debug_struct("Shallow").field("merging", merging).finish(),
            Self::Deep => f.write_str("Deep"),
            Self::Resolve(_) => f.write_str("Resolve(..)"),
        }
    }
}

/// How an incoming batch is combined with the cached collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayPolicy {
    /// Pair entities by identity; new ones are appended (default).
    #[default]
    Merge,
    /// The incoming batch becomes the whole collection.
    Replace,
}
