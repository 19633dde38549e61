//! Path-tree semantics shared by the local backends.
//!
//! Mirrors the hosted database: `null` is absence, empty objects do not
//! exist, a merge replaces each named child wholesale, and removing the last
//! child of a node removes the node.

use models::RecordPath;
use serde_json::{Map, Value};

use crate::errors::StoreError;

/// Value stored at `path`, if any.
pub fn get<'a>(root: &'a Value, path: &RecordPath) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.segments() {
        cur = cur.as_object()?.get(seg)?;
    }
    if cur.is_null() { None } else { Some(cur) }
}

/// Overwrite the value at `path`. Writing `null` or `{}` removes it.
pub fn replace(root: &mut Value, path: &RecordPath, value: Value) {
    match prune(value) {
        Value::Null => remove(root, path),
        value => *slot(root, path.segments()) = value,
    }
}

/// Write each named child of the node at `path`, keeping the rest.
pub fn merge(root: &mut Value, path: &RecordPath, fields: Map<String, Value>) -> Result<(), StoreError> {
    for key in fields.keys() {
        path.child(key).map_err(|e| StoreError::WriteRejected(e.to_string()))?;
    }
    let node = ensure_object(slot(root, path.segments()));
    for (key, value) in fields {
        match prune(value) {
            Value::Null => {
                node.remove(&key);
            }
            value => {
                node.insert(key, value);
            }
        }
    }
    if node.is_empty() {
        remove(root, path);
    }
    Ok(())
}

/// Delete the value at `path` and any ancestors left empty.
pub fn remove(root: &mut Value, path: &RecordPath) {
    if remove_at(root, path.segments()) {
        *root = Value::Object(Map::new());
    }
}

/// Returns whether `node` is empty after the removal.
fn remove_at(node: &mut Value, segs: &[String]) -> bool {
    let Some((first, rest)) = segs.split_first() else {
        return false;
    };
    let Value::Object(map) = node else {
        return false;
    };
    if rest.is_empty() {
        map.remove(first);
    } else if let Some(child) = map.get_mut(first) {
        if remove_at(child, rest) {
            map.remove(first);
        }
    }
    map.is_empty()
}

fn ensure_object(v: &mut Value) -> &mut Map<String, Value> {
    if !v.is_object() {
        *v = Value::Object(Map::new());
    }
    match v {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}

/// Walk to `segs`, creating intermediate objects (and replacing scalars) on the way.
fn slot<'a>(root: &'a mut Value, segs: &[String]) -> &'a mut Value {
    let mut cur = root;
    for seg in segs {
        cur = ensure_object(cur).entry(seg.clone()).or_insert(Value::Null);
    }
    cur
}

/// Drop `null` children and empty objects, bottom-up. An object that ends up
/// empty becomes `null`.
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() { Value::Null } else { Value::Object(map) }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> RecordPath {
        RecordPath::parse(s).unwrap()
    }

    fn fields(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn get_missing_is_none() {
        let root = json!({ "a": { "b": 1 } });
        assert!(get(&root, &p("a/c")).is_none());
        assert!(get(&root, &p("a/b/c")).is_none());
        assert_eq!(get(&root, &p("a/b")), Some(&json!(1)));
    }

    #[test]
    fn merge_keeps_siblings_and_creates_parents() {
        let mut root = json!({});
        merge(&mut root, &p("planets/mars/ali"), fields(json!({ "a": 1 }))).unwrap();
        merge(&mut root, &p("planets/mars/ali"), fields(json!({ "b": 2 }))).unwrap();
        assert_eq!(get(&root, &p("planets/mars/ali")), Some(&json!({ "a": 1, "b": 2 })));
    }

    #[test]
    fn merge_replaces_named_child_wholesale() {
        let mut root = json!({ "n": { "c": { "x": 1, "y": 2 } } });
        merge(&mut root, &p("n"), fields(json!({ "c": { "x": 5 } }))).unwrap();
        assert_eq!(get(&root, &p("n/c")), Some(&json!({ "x": 5 })));
    }

    #[test]
    fn merge_null_deletes_child_and_prunes() {
        let mut root = json!({ "n": { "only": 1 } });
        merge(&mut root, &p("n"), fields(json!({ "only": null }))).unwrap();
        assert_eq!(root, json!({}));
    }

    #[test]
    fn merge_rejects_bad_field_names() {
        let mut root = json!({});
        let err = merge(&mut root, &p("n"), fields(json!({ "a.b": 1 }))).unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected(_)));
        assert_eq!(root, json!({}));
    }

    #[test]
    fn replace_discards_previous_fields() {
        let mut root = json!({});
        replace(&mut root, &p("shop/1"), json!({ "a": 1 }));
        replace(&mut root, &p("shop/1"), json!({ "b": 2 }));
        assert_eq!(get(&root, &p("shop/1")), Some(&json!({ "b": 2 })));
    }

    #[test]
    fn replace_with_empty_removes() {
        let mut root = json!({ "shop": { "1": { "a": 1 } } });
        replace(&mut root, &p("shop/1"), json!({}));
        assert_eq!(root, json!({}));
    }

    #[test]
    fn remove_prunes_empty_ancestors() {
        let mut root = json!({ "planets": { "mars": { "ali": { "a": 1 } }, "venus": { "x": { "a": 1 } } } });
        remove(&mut root, &p("planets/mars/ali"));
        assert_eq!(root, json!({ "planets": { "venus": { "x": { "a": 1 } } } }));
        remove(&mut root, &p("planets/mars/ali"));
        remove(&mut root, &p("planets/venus/x"));
        assert_eq!(root, json!({}));
    }

    #[test]
    fn merge_over_scalar_turns_it_into_object() {
        let mut root = json!({ "n": 3 });
        merge(&mut root, &p("n"), fields(json!({ "a": 1 }))).unwrap();
        assert_eq!(get(&root, &p("n")), Some(&json!({ "a": 1 })));
    }
}
