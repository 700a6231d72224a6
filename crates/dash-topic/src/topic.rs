//! Topic string grammar.

/// Leading segment that routes a topic into the configuration namespace.
pub const CONFIG_ROOT: &str = "$config";

/// Namespace that receives every topic not starting with [`CONFIG_ROOT`].
pub const SERVER_DATA_ROOT: &str = "sd";

/// The two disjoint subtrees of a store document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Config,
    ServerData,
}

impl Namespace {
    pub fn root_key(self) -> &'static str {
        match self {
            Namespace::Config => CONFIG_ROOT,
            Namespace::ServerData => SERVER_DATA_ROOT,
        }
    }

    /// Namespace a topic's segments belong to.
    pub fn of(segments: &[String]) -> Self {
        match segments.first() {
            Some(first) if first == CONFIG_ROOT => Namespace::Config,
            _ => Namespace::ServerData,
        }
    }
}

/// Splits a topic on `/`, dropping empty segments.
///
/// ```
/// use dash_topic::split_topic;
///
/// assert_eq!(split_topic("/a//b/"), vec!["a", "b"]);
/// assert!(split_topic("///").is_empty());
/// ```
pub fn split_topic(topic: &str) -> Vec<String> {
    topic
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins path segments back into a topic, skipping empty ones.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for segment in segments.iter().map(AsRef::as_ref).filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

/// Prefixes `sd` unless the path already starts in the config namespace.
pub fn route(mut segments: Vec<String>) -> Vec<String> {
    if Namespace::of(&segments) == Namespace::ServerData {
        segments.insert(0, SERVER_DATA_ROOT.to_string());
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_skips_empty_segments() {
        assert_eq!(join_path(&["widgets", "", "w1"]), "widgets/w1");
        assert_eq!(join_path::<&str>(&[]), "");
    }

    #[test]
    fn route_keeps_config_topics() {
        assert_eq!(route(split_topic("$config/dash/title")), vec!["$config", "dash", "title"]);
        assert_eq!(route(split_topic("dash/title")), vec!["sd", "dash", "title"]);
    }

    #[test]
    fn config_must_be_first_segment() {
        let segments = split_topic("room/$config");
        assert_eq!(Namespace::of(&segments), Namespace::ServerData);
    }
}
