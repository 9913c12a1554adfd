use blueprinter::{Blueprint, blueprint};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

fn object(fields: &BTreeMap<String, i64>) -> Value {
    Value::Object(fields.iter().map(|(k, v)| (k.clone(), json!(v))).collect())
}

fn stamp(label: String) -> Blueprint<Value, ()> {
    blueprint::<Value, ()>().with_fields(move |_: &Value, _: &()| {
        let mut part = Map::new();
        part.insert("winner".to_owned(), json!(label));
        part.insert(label.clone(), json!(true));
        part
    })
}

proptest! {
    #[test]
    fn keep_fields_is_a_field_union(
        fields in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..12),
        picks in proptest::collection::vec(any::<bool>(), 12),
    ) {
        let names: Vec<String> = fields.keys().cloned().collect();
        let (left, right): (Vec<_>, Vec<_>) =
            names.iter().cloned().zip(picks.iter().copied()).partition(|(_, pick)| *pick);
        let left: Vec<String> = left.into_iter().map(|(name, _)| name).collect();
        let right: Vec<String> = right.into_iter().map(|(name, _)| name).collect();

        let input = object(&fields);
        let both = blueprint::<Value, ()>()
            .keep_fields(left.clone())
            .keep_fields(right.clone())
            .render(&input)
            .unwrap();

        let mut union = blueprint::<Value, ()>().keep_fields(left).render(&input).unwrap();
        union.extend(blueprint::<Value, ()>().keep_fields(right).render(&input).unwrap());

        prop_assert_eq!(Value::Object(both), Value::Object(union));
    }

    #[test]
    fn render_is_deterministic(fields in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..12)) {
        let bp = blueprint::<Value, ()>()
            .keep_fields(fields.keys().cloned().collect::<Vec<_>>())
            .with_fields(|obj: &Value, _: &()| json!({ "size": obj.as_object().map_or(0, Map::len) }));
        let input = object(&fields);
        prop_assert_eq!(bp.render(&input).unwrap(), bp.render(&input).unwrap());
    }

    #[test]
    fn include_blueprint_is_associative(labels in proptest::collection::vec("[a-z]{1,4}", 3)) {
        let (a, b, c) = (stamp(labels[0].clone()), stamp(labels[1].clone()), stamp(labels[2].clone()));
        let left = a.include_blueprint(&b).include_blueprint(&c).render(&json!({})).unwrap();
        let right = a.include_blueprint(&b.include_blueprint(&c)).render(&json!({})).unwrap();

        prop_assert_eq!(&left["winner"], &json!(labels[2]));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn render_array_matches_elementwise_render(values in proptest::collection::vec(any::<i64>(), 0..16)) {
        let bp = blueprint::<Value, ()>()
            .keep_fields(["n"])
            .with_fields(|obj: &Value, _: &()| json!({ "neg": obj["n"].as_i64().map(i64::wrapping_neg) }));
        let inputs: Vec<Value> = values.iter().map(|n| json!({ "n": n })).collect();

        let batch = bp.render_array(&inputs).unwrap();
        let single: Vec<_> = inputs.iter().map(|input| bp.render(input).unwrap()).collect();
        prop_assert_eq!(batch, single);
    }

    #[test]
    fn deferred_render_array_matches_elementwise_render(values in proptest::collection::vec(any::<i64>(), 0..16)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let bp = blueprint::<Value, ()>().keep_fields(["n"]).with_async_fields(|obj: &Value, _: &()| {
            let n = obj["n"].as_i64();
            async move { json!({ "n2": n.map(|n| n.wrapping_mul(2)) }) }
        });
        let inputs: Vec<Value> = values.iter().map(|n| json!({ "n": n })).collect();

        let batch = rt.block_on(bp.render_array(&inputs)).unwrap();
        let single: Vec<_> =
            inputs.iter().map(|input| rt.block_on(bp.render(input)).unwrap()).collect();
        prop_assert_eq!(batch, single);
    }
}
