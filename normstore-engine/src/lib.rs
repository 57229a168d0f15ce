//! Normalized store reconciliation.
//!
//! Pure functions that keep a flat, per-collection entity cache coherent
//! with what the server sends and with what the user has edited but the
//! server has not confirmed yet.
//!
//! # Operations
//!
//! - [`merge_collection`]: identity-based merge of one collection
//! - [`normalize`]: extraction of embedded records into their collections
//! - [`merge_into_state`]: worklist-driven merge of a whole patch
//! - [`delete_from_state`]: removal by identity
//! - [`fold_commits`]: optimistic replay of pending commits
//! - [`reduce`]: one entry point dispatching [`StoreAction`]s
//!
//! None of them mutates its input store. Each returns a new [`Store`] that
//! shares every collection it did not write with the input.
//!
//! # Example
//!
//! ```
//! use normstore_engine::merge_into_state;
//! use normstore_model::{Identity, MergeConfig, Normalizer, NormalizerRule};
//! use normstore_types::{Patch, Store};
//! use serde_json::json;
//!
//! let config = MergeConfig::new(Identity::default())
//!     .with_normalizer(Normalizer::new().rule("customer", NormalizerRule::to("customers")));
//! let patch = Patch::from_value(json!({
//!     "orders": [{"id": 1, "customer": {"id": 9, "name": "X"}}]
//! }))
//! .unwrap();
//!
//! let next = merge_into_state(&Store::new(), &patch, &config).unwrap();
//! assert_eq!(next.entities("orders")[0]["customer"], json!(9));
//! assert_eq!(next.entities("customers"), &[json!({"id": 9, "name": "X"})]);
//! ```
//!
//! [`Store`]: normstore_types::Store

mod collection;
mod commits;
mod delete;
mod error;
mod normalize;
mod reducer;
mod state;

pub use collection::{MergeOptions, deep_merge, merge_collection, merge_collection_into, merge_datum};
pub use commits::{FIRST_DATE_CREATED_FIELD, LAST_DATE_CREATED_FIELD, UUID_FIELD, fold_commits};
pub use delete::delete_from_state;
pub use error::{ReconcileError, ReconcileResult};
pub use normalize::{Normalized, PendingBatch, normalize};
pub use reducer::{StoreAction, reduce};
pub use state::merge_into_state;
