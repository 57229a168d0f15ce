use crate::{ArrayPolicy, DatumPolicy, Identity, KeepFromCommit, KeepNothing, Normalizer, Processor};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Settings for one merge or delete call.
///
/// The identity is required up front; everything else defaults to a plain
/// identity merge with full replacement of matched entities.
#[derive(Clone, Deserialize)]
pub struct MergeConfig {
    pub identity: Identity,
    #[serde(default)]
    pub policy: DatumPolicy,
    #[serde(default)]
    pub array_policy: ArrayPolicy,
    #[serde(default)]
    pub normalizer: Normalizer,
    /// Runs on each top-level patch entry before normalization.
    #[serde(skip)]
    pub processor: Option<Arc<dyn Processor>>,
    /// Reject entities without an identity value instead of letting them
    /// collide.
    #[serde(default)]
    pub strict_identity: bool,
}

impl MergeConfig {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            policy: DatumPolicy::default(),
            array_policy: ArrayPolicy::default(),
            normalizer: Normalizer::default(),
            processor: None,
            strict_identity: false,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: DatumPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_array_policy(mut self, array_policy: ArrayPolicy) -> Self {
        self.array_policy = array_policy;
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processor = Some(Arc::new(processor));
        self
    }

    #[must_use]
    pub fn strict_identity(mut self, strict: bool) -> Self {
        self.strict_identity = strict;
        self
    }
}

impl fmt::Debug for MergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeConfig")
            .field("identity", &self.identity)
            .field("policy", &self.policy)
            .field("array_policy", &self.array_policy)
            .field("normalizer", &self.normalizer)
            .field("processor", &self.processor.is_some())
            .field("strict_identity", &self.strict_identity)
            .finish()
    }
}

/// Settings for folding a commit log.
///
/// `merge` supplies the entity identity, normalizer and processor used for
/// the records embedded in commit patches. The top-level merge always pairs
/// records by commit uuid and merges them deeply.
#[derive(Clone)]
pub struct FoldConfig {
    pub merge: MergeConfig,
    pub keep: Arc<dyn KeepFromCommit>,
}

impl FoldConfig {
    pub fn new(merge: MergeConfig) -> Self {
        Self {
            merge,
            keep: Arc::new(KeepNothing),
        }
    }

    #[must_use]
    pub fn with_keep(mut self, keep: impl KeepFromCommit + 'static) -> Self {
        self.keep = Arc::new(keep);
        self
    }
}

impl fmt::Debug for FoldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldConfig")
            .field("merge", &self.merge)
            .finish_non_exhaustive()
    }
}
