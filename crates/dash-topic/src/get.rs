use serde_json::Value;

use crate::resolve::parse_index;

/// Read-only lookup. Never creates nodes; any miss yields `None`.
pub fn get<'a, S: AsRef<str>>(val: &'a Value, path: &[S]) -> Option<&'a Value> {
    let mut current = val;
    for step in path.iter().map(AsRef::as_ref) {
        if step.is_empty() {
            continue;
        }
        current = match current {
            Value::Array(arr) => arr.get(parse_index(step)?)?,
            Value::Object(map) => map.get(step)?,
            _ => return None,
        };
    }
    Some(current)
}
