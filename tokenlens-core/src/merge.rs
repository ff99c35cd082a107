// Deep merge of per-source extraction outputs.
//
// Arrays union keeping the first-seen copy of structurally equal entries,
// nested objects merge recursively, scalar conflicts take the later
// source's value.

use serde_json::Value;
use tracing::debug;

use crate::error::BuildError;
use crate::types::DeclarationMap;

/// Merge two JSON values following array-union / recursive-object /
/// later-wins semantics.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Array(mut a), Value::Array(b)) => {
            for item in b {
                if !a.contains(&item) {
                    a.push(item);
                }
            }
            Value::Array(a)
        }
        (Value::Object(mut a), Value::Object(b)) => {
            for (key, overlay_value) in b {
                let merged = match a.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                a.insert(key, merged);
            }
            Value::Object(a)
        }
        // Scalar (or mismatched-shape) conflict: later source wins.
        (_, overlay) => overlay,
    }
}

/// Merge a sequence of per-source property→declarations mappings into one
/// typed [`DeclarationMap`].
///
/// Sources are folded in order, so a later source's scalar values shadow
/// earlier ones while declaration arrays accumulate (deduplicated).
pub fn merge_sources<I>(sources: I) -> Result<DeclarationMap, BuildError>
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Value::Object(serde_json::Map::new());
    let mut count = 0usize;
    for source in sources {
        merged = deep_merge(merged, source);
        count += 1;
    }
    debug!(sources = count, "Merged extraction sources");
    Ok(serde_json::from_value(merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arrays_union_with_dedup() {
        let a = json!({"--x": [{"value": "1", "selector": ":root"}]});
        let b = json!({"--x": [
            {"value": "1", "selector": ":root"},
            {"value": "2", "selector": ".dark"}
        ]});
        let merged = deep_merge(a, b);
        assert_eq!(merged["--x"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn objects_merge_recursively() {
        let a = json!({"outer": {"left": 1}});
        let b = json!({"outer": {"right": 2}});
        let merged = deep_merge(a, b);
        assert_eq!(merged["outer"]["left"], 1);
        assert_eq!(merged["outer"]["right"], 2);
    }

    #[test]
    fn scalar_conflict_takes_later_source() {
        let merged = deep_merge(json!({"k": "old"}), json!({"k": "new"}));
        assert_eq!(merged["k"], "new");
    }

    #[test]
    fn merge_sources_concatenates_declarations() {
        let sources = vec![
            json!({"--color": [{"value": "red", "selector": ":root"}]}),
            json!({"--color": [{"value": "blue", "selector": ".inverted"}],
                   "--size": [{"value": "2rem", "selector": ":root"}]}),
        ];
        let map = merge_sources(sources).unwrap();
        assert_eq!(map["--color"].len(), 2);
        assert_eq!(map["--size"].len(), 1);
        assert_eq!(map["--color"][0].value, "red");
        assert_eq!(map["--color"][1].selector, ".inverted");
    }

    #[test]
    fn merge_sources_dedups_exact_duplicates() {
        let decl = json!({"value": "red", "selector": ":root"});
        let sources = vec![
            json!({ "--color": [decl.clone()] }),
            json!({ "--color": [decl] }),
        ];
        let map = merge_sources(sources).unwrap();
        assert_eq!(map["--color"].len(), 1, "Exact duplicate should collapse");
    }

    #[test]
    fn merge_sources_rejects_malformed_shape() {
        let sources = vec![json!({"--color": "not-an-array"})];
        assert!(merge_sources(sources).is_err());
    }
}
