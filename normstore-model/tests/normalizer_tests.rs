use normstore_model::{ArrayPolicy, DatumPolicy, Identity, Normalizer, NormalizerRule};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn shorthand_rule_is_collection_name() {
    let normalizer: Normalizer = serde_json::from_value(json!({
        "managedVenues": "venues",
        "managingOfferer": "offerers",
    }))
    .unwrap();

    assert_eq!(normalizer.len(), 2);
    let rule = normalizer.get("managedVenues").unwrap();
    assert_eq!(rule.collection, "venues");
    assert!(rule.policy.is_none());
    assert!(rule.normalizer.is_empty());
}

#[test]
fn detailed_rule_accepts_state_key_alias() {
    let normalizer: Normalizer = serde_json::from_value(json!({
        "stocks": {
            "stateKey": "stocks",
            "policy": {"kind": "deep"},
            "array_policy": "replace",
            "identity": "humanId",
        }
    }))
    .unwrap();

    let rule = normalizer.get("stocks").unwrap();
    assert_eq!(rule.collection, "stocks");
    assert!(matches!(rule.policy, Some(DatumPolicy::Deep)));
    assert_eq!(rule.array_policy, Some(ArrayPolicy::Replace));
    assert_eq!(rule.identity.as_ref().and_then(Identity::field_name), Some("humanId"));
}

#[test]
fn nested_normalizers_parse_recursively() {
    let normalizer: Normalizer = serde_json::from_value(json!({
        "venue": {
            "collection": "venues",
            "normalizer": {
                "managingOfferer": {
                    "collection": "offerers",
                    "policy": {"kind": "shallow", "merging": true},
                }
            }
        }
    }))
    .unwrap();

    let venue = normalizer.get("venue").unwrap();
    let offerer = venue.normalizer.get("managingOfferer").unwrap();
    assert_eq!(offerer.collection, "offerers");
    assert!(matches!(offerer.policy, Some(DatumPolicy::Shallow { merging: true })));
}

#[test]
fn unknown_rule_fields_are_rejected() {
    let result = serde_json::from_value::<Normalizer>(json!({
        "venue": {"collection": "venues", "isMergingDatum": true}
    }));
    assert!(result.is_err());
}

#[test]
fn builder_matches_json_form() {
    let built = Normalizer::new().rule(
        "venue",
        NormalizerRule::to("venues")
            .with_policy(DatumPolicy::Deep)
            .with_normalizer(Normalizer::new().rule("managingOfferer", NormalizerRule::to("offerers"))),
    );

    assert_eq!(
        serde_json::to_value(&built).unwrap(),
        json!({
            "venue": {
                "collection": "venues",
                "policy": {"kind": "deep"},
                "normalizer": {"managingOfferer": {"collection": "offerers"}},
            }
        })
    );
}

#[test]
fn rule_with_processor_still_serializes() {
    let rule = NormalizerRule::to("venues").with_processor(|_: &str, entities: Vec<serde_json::Value>| entities);
    assert!(rule.processor.is_some());
    assert_eq!(serde_json::to_value(&rule).unwrap(), json!({"collection": "venues"}));
}
