//! Mutable path resolution with auto-vivification.

use serde_json::{Map, Value};

use crate::{kind_of, ResolveError};

/// Parses an array index segment. Only plain ASCII digits are accepted, so
/// `-1`, `+1` and `1x` are all rejected.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Walks `path` down from `root` and returns the node it ends at.
///
/// Empty segments are skipped. Arrays require an in-range index. Objects
/// create an empty object for a missing key (or a `null` placeholder) so
/// later writes can go through paths that were never populated. Anything
/// else fails with [`ResolveError::NotTraversable`].
///
/// Callers that want to write pop the final key first and resolve the
/// remaining path to get the container.
pub fn resolve<'a, S: AsRef<str>>(
    root: &'a mut Value,
    path: &[S],
) -> Result<&'a mut Value, ResolveError> {
    let mut node = root;
    for step in path.iter().map(AsRef::as_ref) {
        if step.is_empty() {
            continue;
        }
        node = match node {
            Value::Array(arr) => {
                let len = arr.len();
                let ix = parse_index(step)
                    .filter(|&ix| ix < len)
                    .ok_or_else(|| ResolveError::Index {
                        index: step.to_string(),
                        len,
                    })?;
                &mut arr[ix]
            }
            Value::Object(map) => {
                let slot = map.entry(step.to_string()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                slot
            }
            other => {
                return Err(ResolveError::NotTraversable {
                    segment: step.to_string(),
                    found: kind_of(other),
                })
            }
        };
    }
    Ok(node)
}
