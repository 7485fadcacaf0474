use serde_json::{Map, Value};

use crate::model::FieldUpdate;

/// Apply `updates` in order to a copy of `doc`.
pub fn apply_updates(doc: &Value, updates: &[FieldUpdate]) -> Value {
    updates.iter().fold(doc.clone(), |mut acc, update| {
        apply_update(&mut acc, update);
        acc
    })
}

/// Build a document from nothing but the mutation list.
pub fn synthesize(updates: &[FieldUpdate]) -> Value {
    apply_updates(&Value::Object(Map::new()), updates)
}

fn apply_update(doc: &mut Value, update: &FieldUpdate) {
    match update {
        FieldUpdate::Set { property, value } => {
            *slot_mut(doc, property) = value.clone();
        }
        FieldUpdate::Push { property, value } => {
            array_mut(slot_mut(doc, property)).push(value.clone());
        }
        FieldUpdate::Delete { property, value } => {
            let items = array_mut(slot_mut(doc, property));
            if let Some(pos) = items.iter().position(|v| v == value) {
                items.remove(pos);
            }
        }
    }
}

/// Walk a dotted path, creating objects on the way (non-objects are overwritten).
fn slot_mut<'a>(doc: &'a mut Value, path: &str) -> &'a mut Value {
    let mut cur = doc;
    for segment in path.split('.') {
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        let Value::Object(map) = cur else {
            unreachable!("slot was just made an object")
        };
        cur = map.entry(segment).or_insert(Value::Null);
    }
    cur
}

/// Anything that is not an array becomes an empty one.
fn array_mut(slot: &mut Value) -> &mut Vec<Value> {
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    let Value::Array(items) = slot else {
        unreachable!("slot was just made an array")
    };
    items
}
