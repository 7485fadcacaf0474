//! Document predicate evaluation.
//!
//! A filter is a JSON object whose keys are dotted field paths. A plain value
//! means strict equality with the field; an object made only of `$`-prefixed
//! keys applies operators. `$and` / `$or` at clause level combine sub-filters.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// True if `doc` satisfies every clause of `filter`. `null` and `{}` match anything.
pub fn matches(doc: &Value, filter: &Value) -> bool {
    match filter {
        Value::Null => true,
        Value::Object(clauses) => clauses
            .iter()
            .all(|(key, cond)| clause_matches(doc, key, cond)),
        _ => false,
    }
}

/// Resolve a dotted path. Numeric segments index into arrays.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |cur, segment| match cur {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn clause_matches(doc: &Value, key: &str, cond: &Value) -> bool {
    match key {
        "$and" => cond
            .as_array()
            .is_some_and(|filters| filters.iter().all(|f| matches(doc, f))),
        "$or" => cond
            .as_array()
            .is_some_and(|filters| filters.iter().any(|f| matches(doc, f))),
        path => {
            let field = lookup(doc, path);
            match cond {
                Value::Object(ops) if is_operator_object(ops) => ops
                    .iter()
                    .all(|(op, arg)| operator_matches(field, op, arg)),
                literal => field == Some(literal),
            }
        }
    }
}

fn is_operator_object(ops: &Map<String, Value>) -> bool {
    !ops.is_empty() && ops.keys().all(|k| k.starts_with('$'))
}

fn operator_matches(field: Option<&Value>, op: &str, arg: &Value) -> bool {
    match op {
        "$eq" => field == Some(arg),
        "$ne" => field != Some(arg),
        "$gt" => compare(field, arg) == Some(Ordering::Greater),
        "$gte" => matches!(compare(field, arg), Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => compare(field, arg) == Some(Ordering::Less),
        "$lte" => matches!(compare(field, arg), Some(Ordering::Less | Ordering::Equal)),
        "$in" => arg
            .as_array()
            .is_some_and(|set| field.is_some_and(|f| set.contains(f))),
        "$nin" => arg
            .as_array()
            .is_some_and(|set| field.is_none_or(|f| !set.contains(f))),
        "$contains" => contains(field, arg),
        "$containsAny" => arg
            .as_array()
            .is_some_and(|needles| needles.iter().any(|n| contains(field, n))),
        "$exists" => arg.as_bool().is_some_and(|want| field.is_some() == want),
        "$size" => field
            .and_then(Value::as_array)
            .is_some_and(|items| arg.as_u64() == Some(items.len() as u64)),
        _ => false,
    }
}

fn contains(field: Option<&Value>, needle: &Value) -> bool {
    match field {
        Some(Value::Array(items)) => items.contains(needle),
        Some(Value::String(s)) => needle.as_str().is_some_and(|n| s.contains(n)),
        _ => false,
    }
}

/// Numbers numerically, strings lexicographically; anything else is unordered.
fn compare(field: Option<&Value>, arg: &Value) -> Option<Ordering> {
    match (field?, arg) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(&json!({ "a": 1 }), &json!({})));
        assert!(matches(&json!({}), &Value::Null));
    }

    #[test]
    fn non_object_filter_matches_nothing() {
        assert!(!matches(&json!({ "a": 1 }), &json!([1])));
        assert!(!matches(&json!({ "a": 1 }), &json!("a")));
    }

    #[test]
    fn literal_equality_is_strict() {
        let doc = json!({ "response": "42" });
        assert!(matches(&doc, &json!({ "response": "42" })));
        assert!(!matches(&doc, &json!({ "response": 42 })));
        assert!(!matches(&doc, &json!({ "other": "42" })));
    }

    #[test]
    fn all_clauses_must_hold() {
        let doc = json!({ "a": 1, "b": 2 });
        assert!(matches(&doc, &json!({ "a": 1, "b": 2 })));
        assert!(!matches(&doc, &json!({ "a": 1, "b": 3 })));
    }

    #[test]
    fn dotted_paths() {
        let doc = json!({ "user": { "name": "ada", "tags": ["x", "y"] } });
        assert!(matches(&doc, &json!({ "user.name": "ada" })));
        assert!(matches(&doc, &json!({ "user.tags.1": "y" })));
        assert_eq!(lookup(&doc, "user.missing"), None);
        assert_eq!(lookup(&doc, "user.name.deeper"), None);
    }

    #[test]
    fn nested_object_literal_is_equality() {
        let doc = json!({ "pos": { "x": 1 } });
        assert!(matches(&doc, &json!({ "pos": { "x": 1 } })));
        assert!(!matches(&doc, &json!({ "pos": { "x": 2 } })));
    }

    #[test]
    fn contains_on_arrays_and_strings() {
        let doc = json!({ "response": ["66", "42"], "title": "hello world" });
        assert!(matches(&doc, &json!({ "response": { "$contains": "42" } })));
        assert!(!matches(&doc, &json!({ "response": { "$contains": "33" } })));
        assert!(matches(&doc, &json!({ "title": { "$contains": "lo wo" } })));
        assert!(matches(&doc, &json!({ "response": { "$containsAny": ["1", "66"] } })));
        assert!(!matches(&json!({}), &json!({ "response": { "$contains": "42" } })));
    }

    #[test]
    fn comparisons() {
        let doc = json!({ "n": 5, "s": "b" });
        assert!(matches(&doc, &json!({ "n": { "$gt": 4 } })));
        assert!(matches(&doc, &json!({ "n": { "$gte": 5, "$lte": 5 } })));
        assert!(!matches(&doc, &json!({ "n": { "$lt": 5 } })));
        assert!(matches(&doc, &json!({ "n": { "$lt": 5.5 } })));
        assert!(matches(&doc, &json!({ "s": { "$gt": "a" } })));
        // mixed types are unordered
        assert!(!matches(&doc, &json!({ "n": { "$gt": "a" } })));
        assert!(!matches(&doc, &json!({ "missing": { "$lt": 10 } })));
    }

    #[test]
    fn membership_and_existence() {
        let doc = json!({ "c": "red", "tags": [1, 2, 3] });
        assert!(matches(&doc, &json!({ "c": { "$in": ["red", "blue"] } })));
        assert!(!matches(&doc, &json!({ "c": { "$nin": ["red"] } })));
        assert!(matches(&doc, &json!({ "missing": { "$nin": ["red"] } })));
        assert!(matches(&doc, &json!({ "c": { "$exists": true } })));
        assert!(matches(&doc, &json!({ "missing": { "$exists": false } })));
        assert!(matches(&doc, &json!({ "tags": { "$size": 3 } })));
        assert!(matches(&doc, &json!({ "c": { "$ne": "blue" } })));
        assert!(matches(&doc, &json!({ "c": { "$eq": "red" } })));
    }

    #[test]
    fn logical_combinators() {
        let doc = json!({ "a": 1, "b": 2 });
        assert!(matches(&doc, &json!({ "$or": [{ "a": 2 }, { "b": 2 }] })));
        assert!(!matches(&doc, &json!({ "$and": [{ "a": 1 }, { "b": 3 }] })));
        assert!(!matches(&doc, &json!({ "$or": "nope" })));
    }

    #[test]
    fn unknown_operator_never_matches() {
        assert!(!matches(&json!({ "a": 1 }), &json!({ "a": { "$regex": "1" } })));
    }
}
