//! Merge model for normstore.
//!
//! Declares how incoming entities are reconciled with cached ones:
//! - [`Identity`]: how an entity's identity value is read (`id` by default)
//! - [`DatumPolicy`] / [`ArrayPolicy`]: per-entity and per-collection merge rules
//! - [`Normalizer`] / [`NormalizerRule`]: which nested fields hold records
//!   of other collections
//! - [`Resolver`], [`Processor`], [`KeepFromCommit`]: call-site hooks
//! - [`MergeConfig`] / [`FoldConfig`]: everything one engine call needs
//!
//! The data parts of this model deserialize from JSON, so call sites can
//! declare normalizers the same way the API responses are described.

mod config;
mod hooks;
mod identity;
mod normalizer;
mod policy;

pub use config::{FoldConfig, MergeConfig};
pub use hooks::{KeepFromCommit, KeepNothing, Processor, ResolveContext, Resolver, Tagger, TAGS_FIELD};
pub use identity::Identity;
pub use normalizer::{Normalizer, NormalizerRule};
pub use policy::{ArrayPolicy, DatumPolicy};
