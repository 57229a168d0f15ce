use crate::{ArrayPolicy, DatumPolicy, Identity, Processor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::sync::Arc;

/// Declares which fields of an entity embed records of other collections.
///
/// Keys are field names of the parent entity. In JSON a rule is either the
/// target collection name or a detailed object:
///
/// ```json
/// {
///   "managedVenues": "venues",
///   "stocks": { "stateKey": "stocks", "policy": { "kind": "deep" } },
///   "venue": {
///     "collection": "venues",
///     "normalizer": { "managingOfferer": "offerers" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Normalizer {
    rules: BTreeMap<String, NormalizerRule>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style rule registration for `field`.
    #[must_use]
    pub fn rule(mut self, field: impl Into<String>, rule: NormalizerRule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    pub fn get(&self, field: &str) -> Option<&NormalizerRule> {
        self.rules.get(field)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, NormalizerRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Extraction rule for one nested field.
///
/// Unset overrides fall back to the enclosing merge configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "RuleRepr")]
pub struct NormalizerRule {
    /// Collection the extracted records are merged into.
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<DatumPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_policy: Option<ArrayPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    /// Runs on the extracted records before references are taken.
    #[serde(skip)]
    pub processor: Option<Arc<dyn Processor>>,
    /// Rules for fields nested inside the extracted records.
    #[serde(default, skip_serializing_if = "Normalizer::is_empty")]
    pub normalizer: Normalizer,
}

impl NormalizerRule {
    /// Extract into `collection` with inherited settings.
    pub fn to(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            policy: None,
            array_policy: None,
            identity: None,
            processor: None,
            normalizer: Normalizer::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: DatumPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn with_array_policy(mut self, array_policy: ArrayPolicy) -> Self {
        self.array_policy = Some(array_policy);
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    #[must_use]
    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processor = Some(Arc::new(processor));
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

impl fmt::Debug for NormalizerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizerRule")
            .field("collection", &self.collection)
            .field("policy", &self.policy)
            .field("array_policy", &self.array_policy)
            .field("identity", &self.identity)
            .field("processor", &self.processor.is_some())
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleRepr {
    Collection(String),
    Detailed(DetailedRule),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedRule {
    #[serde(alias = "stateKey")]
    collection: String,
    #[serde(default)]
    policy: Option<DatumPolicy>,
    #[serde(default)]
    array_policy: Option<ArrayPolicy>,
    #[serde(default)]
    identity: Option<Identity>,
    #[serde(default)]
    normalizer: Normalizer,
}

impl From<RuleRepr> for NormalizerRule {
    fn from(repr: RuleRepr) -> Self {
        match repr {
            RuleRepr::Collection(collection) => Self::to(collection),
            RuleRepr::Detailed(rule) => Self {
                collection: rule.collection,
                policy: rule.policy,
                array_policy: rule.array_policy,
                identity: rule.identity,
                processor: None,
                normalizer: rule.normalizer,
            },
        }
    }
}
