use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Accessor = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Reads the identity value of an entity.
///
/// Within one collection identity values are unique. An entity without one
/// (field absent or `null`) has identity `None`, and all such entities
/// collide with each other unless the merge runs with strict identity.
#[derive(Clone)]
pub struct Identity {
    kind: IdentityKind,
}

#[derive(Clone)]
enum IdentityKind {
    Field(String),
    Accessor(Accessor),
}

impl Identity {
    /// Identity stored in a top-level field of the entity.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            kind: IdentityKind::Field(name.into()),
        }
    }

    /// Identity computed by a function, e.g. a composite key.
    pub fn accessor<F>(accessor: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            kind: IdentityKind::Accessor(Arc::new(accessor)),
        }
    }

    /// The field name, when the identity is a plain field.
    pub fn field_name(&self) -> Option<&str> {
        match &self.kind {
            IdentityKind::Field(name) => Some(name.as_str()),
            IdentityKind::Accessor(_) => None,
        }
    }

    /// Returns the identity value of `datum`, or `None` when it has none.
    pub fn value_of(&self, datum: &Value) -> Option<Value> {
        let value = match &self.kind {
            IdentityKind::Field(name) => datum.get(name).cloned(),
            IdentityKind::Accessor(accessor) => accessor(datum),
        };
        value.filter(|v| !v.is_null())
    }
}

impl Default for Identity {
    /// The conventional `id` field.
    fn default() -> Self {
        Self::field("id")
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IdentityKind::Field(name) => f.debug_tuple("Identity::Field").field(name).finish(),
            IdentityKind::Accessor(_) => f.write_str("Identity::Accessor(..)"),
        }
    }
}

// Only field identities have a JSON form: the field name.
impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.kind {
            IdentityKind::Field(name) => serializer.serialize_str(name),
            IdentityKind::Accessor(_) => Err(ser::Error::custom(
                "accessor identities cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        if name.is_empty() {
            return Err(de::Error::custom("identity field name must not be empty"));
        }
        Ok(Self::field(name))
    }
}
