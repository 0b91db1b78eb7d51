//! Presence checks and merge helpers shared by node and group queries.
//!
//! Every merge helper has the shape `fn(Option<Value>, Value) -> Option<Value>`:
//! the first argument is the value accumulated so far (`None` until something
//! has been found), the second one is the next value discovered during a
//! traversal.

use serde_json::Value;

/// Returns `true` for a JSON object with at least one key.
///
/// Booleans, arrays, `null` and `{}` all count as "absent".
pub fn is_non_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| !map.is_empty())
}

/// Returns the list stored under `key`, treating anything else as absent.
pub fn list_field<'a>(schema: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    schema.get(key).and_then(Value::as_array)
}

/// Collects distinct values.
///
/// The first value is kept as is. A second, different value turns the result
/// into an array of both; later values are appended unless already present.
/// A field whose own value is an array is therefore ambiguous under this
/// merge; use [`common_values`] for such fields.
pub fn list_values(current: Option<Value>, value: Value) -> Option<Value> {
    match current {
        None => Some(value),
        Some(current) if current == value => Some(current),
        Some(Value::Array(mut list)) => {
            if !list.contains(&value) {
                list.push(value);
            }
            Some(Value::Array(list))
        }
        Some(current) => Some(Value::Array(vec![current, value])),
    }
}

/// Keeps the larger of two numbers. Non-numeric values are ignored.
pub fn maximum_value(current: Option<Value>, value: Value) -> Option<Value> {
    pick_number(current, value, |current, value| value > current)
}

/// Keeps the smaller of two numbers. Non-numeric values are ignored.
pub fn minimum_value(current: Option<Value>, value: Value) -> Option<Value> {
    pick_number(current, value, |current, value| value < current)
}

fn pick_number(
    current: Option<Value>,
    value: Value,
    replace: impl Fn(f64, f64) -> bool,
) -> Option<Value> {
    let Some(candidate) = value.as_f64() else {
        return current;
    };
    match current.as_ref().and_then(Value::as_f64) {
        Some(existing) if !replace(existing, candidate) => current,
        _ => Some(value),
    }
}

/// Intersects two value lists, e.g. the `enum` of several sub-schemas.
///
/// Scalars are treated as single-element lists. Equal inputs are returned
/// unchanged; otherwise the result is the array of values present in both,
/// in the order of `current`.
pub fn common_values(current: Option<Value>, value: Value) -> Option<Value> {
    let Some(current) = current else {
        return Some(value);
    };
    if current == value {
        return Some(current);
    }
    let other = as_list(&value);
    let common = as_list(&current)
        .into_iter()
        .filter(|entry| other.contains(entry))
        .cloned()
        .collect();
    Some(Value::Array(common))
}

fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(list) => list.iter().collect(),
        other => vec![other],
    }
}

/// Boolean OR; a non-boolean value counts as `false`.
pub fn any_true(current: Option<Value>, value: Value) -> Option<Value> {
    let current = current.as_ref().and_then(Value::as_bool).unwrap_or(false);
    Some(Value::Bool(current || value.as_bool().unwrap_or(false)))
}
