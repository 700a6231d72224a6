//! Topic addressing for dashboard config trees.
//!
//! A topic is a `/`-separated path into a JSON document. Empty segments are
//! ignored, so `a//b/`, `/a/b` and `a/b` all address the same node. A leading
//! `$config` segment routes into the configuration namespace, anything else
//! lands in the server-data namespace `sd`.
//!
//! # Example
//!
//! ```
//! use dash_topic::{resolve, route, split_topic};
//! use serde_json::json;
//!
//! let mut doc = json!({"sd": {"room": {"temp": 21}}, "$config": {}});
//!
//! let path = route(split_topic("room/temp"));
//! assert_eq!(path, vec!["sd", "room", "temp"]);
//!
//! let (key, parent) = path.split_last().unwrap();
//! let dir = resolve(&mut doc, parent).unwrap();
//! assert_eq!(dir[key.as_str()], json!(21));
//! ```

use thiserror::Error;

pub mod get;
pub mod resolve;
pub mod topic;

pub use get::get;
pub use resolve::{parse_index, resolve};
pub use topic::{join_path, route, split_topic, Namespace, CONFIG_ROOT, SERVER_DATA_ROOT};

/// Errors raised while walking a path through a document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Non-numeric, negative or out-of-range index applied to an array.
    #[error("array index '{index}' is not valid for an array of length {len}")]
    Index { index: String, len: usize },
    /// A path segment was applied to a scalar.
    #[error("level '{segment}' is not traversable: found {found}")]
    NotTraversable { segment: String, found: &'static str },
}

/// Short name of a JSON value's type, used in error messages.
pub fn kind_of(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
