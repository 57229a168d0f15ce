use normstore_engine::{Normalized, merge_into_state, normalize};
use normstore_model::{DatumPolicy, Identity, MergeConfig, Normalizer, NormalizerRule, Tagger, TAGS_FIELD};
use normstore_types::{Patch, Store};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn merge(patch: Value, config: &MergeConfig) -> Store {
    merge_into_state(&Store::new(), &Patch::from_value(patch).unwrap(), config).unwrap()
}

fn customer_config() -> MergeConfig {
    MergeConfig::new(Identity::default())
        .with_normalizer(Normalizer::new().rule("customer", NormalizerRule::to("customers")))
}

// ── Single level ─────────────────────────────────────────────────

#[test]
fn embedded_record_becomes_reference() {
    let store = merge(
        json!({"orders": [{"id": 1, "customer": {"id": 9, "name": "X"}}]}),
        &customer_config(),
    );

    assert_eq!(store.entities("orders"), &[json!({"id": 1, "customer": 9})]);
    assert_eq!(store.entities("customers"), &[json!({"id": 9, "name": "X"})]);
}

#[test]
fn normalize_reports_one_batch_per_rule() {
    let config = customer_config();
    let Normalized { entities, nested } = normalize(
        "orders",
        vec![
            json!({"id": 1, "customer": {"id": 9}}),
            json!({"id": 2, "customer": {"id": 8}}),
            json!({"id": 3}),
        ],
        &config.normalizer,
        &config,
    )
    .unwrap();

    assert_eq!(entities[0]["customer"], json!(9));
    assert_eq!(entities[2], json!({"id": 3}));
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].collection, "customers");
    assert_eq!(nested[0].entities, vec![json!({"id": 9}), json!({"id": 8})]);
}

#[test]
fn empty_normalizer_leaves_entities_alone() {
    let config = MergeConfig::new(Identity::default());
    let entities = vec![json!({"id": 1, "customer": {"id": 9}})];
    let normalized = normalize("orders", entities.clone(), &config.normalizer, &config).unwrap();
    assert_eq!(normalized.entities, entities);
    assert!(normalized.nested.is_empty());
}

#[test]
fn arrays_become_reference_arrays() {
    let config = MergeConfig::new(Identity::default())
        .with_normalizer(Normalizer::new().rule("managedVenues", NormalizerRule::to("venues")));
    let store = merge(
        json!({"offerers": [{"id": "O1", "managedVenues": [{"id": "V1"}, {"id": "V2"}, "V3"]}]}),
        &config,
    );

    assert_eq!(store.entities("offerers"), &[json!({"id": "O1", "managedVenues": ["V1", "V2", "V3"]})]);
    assert_eq!(store.entities("venues"), &[json!({"id": "V1"}), json!({"id": "V2"})]);
}

#[test]
fn scalar_fields_are_already_references() {
    let config = MergeConfig::new(Identity::default())
        .with_normalizer(Normalizer::new().rule("managingOffererId", NormalizerRule::to("offerers")));
    let store = merge(json!({"venues": [{"id": "V1", "managingOffererId": "O1"}]}), &config);

    assert_eq!(store.entities("venues"), &[json!({"id": "V1", "managingOffererId": "O1"})]);
    assert!(!store.contains("offerers"));
}

#[test]
fn null_nested_field_is_kept() {
    let store = merge(json!({"orders": [{"id": 1, "customer": null}]}), &customer_config());
    assert_eq!(store.entities("orders"), &[json!({"id": 1, "customer": null})]);
    assert!(!store.contains("customers"));
}

// ── Shared children ──────────────────────────────────────────────

#[test]
fn child_under_two_parents_is_merged_once_last_wins() {
    let store = merge(
        json!({"orders": [
            {"id": 1, "customer": {"id": 9, "name": "X"}},
            {"id": 2, "customer": {"id": 9, "name": "Y"}},
        ]}),
        &customer_config(),
    );

    assert_eq!(store.entities("customers"), &[json!({"id": 9, "name": "Y"})]);
    assert_eq!(store.entities("orders")[0]["customer"], json!(9));
    assert_eq!(store.entities("orders")[1]["customer"], json!(9));
}

#[test]
fn rule_policy_overrides_config_policy() {
    let config = MergeConfig::new(Identity::default()).with_normalizer(
        Normalizer::new().rule("customer", NormalizerRule::to("customers").with_policy(DatumPolicy::Deep)),
    );
    let store = merge(
        json!({"orders": [
            {"id": 1, "customer": {"id": 9, "name": "X"}},
            {"id": 2, "customer": {"id": 9, "email": "x@example.org"}},
        ]}),
        &config,
    );

    assert_eq!(
        store.entities("customers"),
        &[json!({"id": 9, "name": "X", "email": "x@example.org"})]
    );
}

// ── Depth ────────────────────────────────────────────────────────

#[test]
fn sub_normalizers_extract_at_every_depth() {
    let normalizer: Normalizer = serde_json::from_value(json!({
        "venue": {
            "collection": "venues",
            "normalizer": {
                "managingOfferer": {
                    "stateKey": "offerers",
                    "normalizer": {"bankInformation": "bankInformations"}
                }
            }
        },
        "stocks": "stocks",
    }))
    .unwrap();
    let config = MergeConfig::new(Identity::default()).with_normalizer(normalizer);

    let store = merge(
        json!({"offers": {
            "id": "A1",
            "stocks": [{"id": "S1", "price": 10}],
            "venue": {
                "id": "V1",
                "managingOfferer": {"id": "O1", "bankInformation": {"id": "B1", "iban": "FR76"}},
            },
        }}),
        &config,
    );

    assert_eq!(store.entities("offers"), &[json!({"id": "A1", "stocks": ["S1"], "venue": "V1"})]);
    assert_eq!(store.entities("stocks"), &[json!({"id": "S1", "price": 10})]);
    assert_eq!(store.entities("venues"), &[json!({"id": "V1", "managingOfferer": "O1"})]);
    assert_eq!(store.entities("offerers"), &[json!({"id": "O1", "bankInformation": "B1"})]);
    assert_eq!(store.entities("bankInformations"), &[json!({"id": "B1", "iban": "FR76"})]);
}

#[test]
fn deep_chain_does_not_grow_the_stack() {
    fn chain(depth: usize) -> (Value, Normalizer) {
        let mut payload = json!({"id": depth});
        let mut normalizer = Normalizer::new();
        for level in (0..depth).rev() {
            payload = json!({"id": level, "child": payload});
            normalizer = Normalizer::new()
                .rule("child", NormalizerRule::to(format!("level{}", level + 1)).with_normalizer(normalizer));
        }
        (payload, normalizer)
    }

    let (payload, normalizer) = chain(60);
    let config = MergeConfig::new(Identity::default()).with_normalizer(normalizer);
    let store = merge(json!({"level0": [payload]}), &config);

    assert_eq!(store.len(), 61);
    assert_eq!(store.entities("level0"), &[json!({"id": 0, "child": 1})]);
    assert_eq!(store.entities("level60"), &[json!({"id": 60})]);
}

// ── Rule settings ────────────────────────────────────────────────

#[test]
fn rule_identity_is_used_for_references() {
    let config = MergeConfig::new(Identity::default()).with_normalizer(
        Normalizer::new().rule("author", NormalizerRule::to("users").with_identity(Identity::field("email"))),
    );
    let store = merge(
        json!({"reviews": [{"id": 1, "author": {"email": "a@example.org", "name": "A"}}]}),
        &config,
    );

    assert_eq!(store.entities("reviews"), &[json!({"id": 1, "author": "a@example.org"})]);
    assert_eq!(store.entities("users"), &[json!({"email": "a@example.org", "name": "A"})]);
}

#[test]
fn rule_processor_runs_on_extracted_records() {
    let config = MergeConfig::new(Identity::default()).with_normalizer(
        Normalizer::new().rule("venue", NormalizerRule::to("venues").with_processor(Tagger::new("embedded"))),
    );
    let store = merge(json!({"offers": [{"id": 1, "venue": {"id": "V1"}}]}), &config);

    assert_eq!(store.entities("venues")[0][TAGS_FIELD], json!(["embedded"]));
    assert!(store.entities("offers")[0].get(TAGS_FIELD).is_none());
}

#[test]
fn missing_child_identity_becomes_null_reference() {
    let store = merge(json!({"orders": [{"id": 1, "customer": {"name": "anon"}}]}), &customer_config());
    assert_eq!(store.entities("orders"), &[json!({"id": 1, "customer": null})]);
    assert_eq!(store.entities("customers"), &[json!({"name": "anon"})]);
}
